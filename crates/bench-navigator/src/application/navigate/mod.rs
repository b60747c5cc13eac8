//! Navigator: recognise the device screen and press buttons until a target
//! state shows up.
//!
//! # How a navigation step works (for beginners)
//!
//! ```text
//!   DeviceLink::next_frame ──► decode_frame ──► Recognizer::recognize
//!            ▲                                          │
//!            │                                          ▼
//!   DeviceLink::send_input ◄── press(direction) ◄── target present? ── yes ─► done
//! ```
//!
//! Every loop in this module has a deadline.  A screen that never shows up
//! is an expected outcome on a real bench (a missing template, a slow
//! device), so the recognition helpers report it as a value (an empty match
//! list, `false`) and the navigation helpers as a recoverable
//! [`NavigationError`].  Only transport failures and programmer mistakes
//! (an unknown button name) are fatal.
//!
//! # Sub-modules
//!
//! - **`menu`** – menu enumeration, first-entry lookup and return-to-home.
//! - **`browser`** – the staged file-browser sequences (`open_file`,
//!   `delete_file`).

mod browser;
mod menu;

pub use browser::{DELETE_ACTION, FILE_LIST_REGION, HEADER_REGION, RUN_IN_APP_ACTION};
pub use menu::UNRECOGNIZED_ENTRY;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bench_core::recognition::{synthesize_variants, TextRenderer};
use bench_core::{
    decode_frame, ConfigurationError, Frame, FrameError, InputEvent, InputKey, KeyboardError,
    PressDuration, RecognitionMatch, Recognizer, Region, TemplateLibrary,
};
use thiserror::Error;
use tracing::{debug, error, info, info_span, instrument, warn, Span};
use uuid::Uuid;

// ── Errors ────────────────────────────────────────────────────────────────────

/// Errors raised by a [`DeviceLink`] implementation.
#[derive(Debug, Error)]
pub enum LinkError {
    /// `next_frame` was called before `start_screen_stream`.
    #[error("screen stream is not running")]
    StreamNotStarted,
    /// The device session has ended.
    #[error("device link closed")]
    Closed,
    /// Any other transport failure.
    #[error("device transport error: {0}")]
    Transport(String),
}

/// Errors raised while persisting a frame snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("no snapshot store configured")]
    NotConfigured,
    #[error("failed to create snapshot directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write snapshot {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Error type for navigation use cases.
#[derive(Debug, Error)]
pub enum NavigationError {
    #[error(transparent)]
    Link(#[from] LinkError),

    #[error("undecodable frame: {0}")]
    Frame(#[from] FrameError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Keyboard(#[from] KeyboardError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    /// No stored template, and no text template could be rendered.
    #[error("no template for {target:?} and none could be rendered")]
    NoTemplate { target: String },

    #[error("{target:?} not reached within {timeout:?}")]
    NotReached { target: String, timeout: Duration },

    #[error("home screen not reached within {timeout:?}")]
    HomeScreenUnreachable { timeout: Duration },

    #[error("menu scan did not complete a cycle within {timeout:?}")]
    MenuScanTimedOut { timeout: Duration },

    #[error("file browser has no section for module {module:?}")]
    ModuleNotFound { module: String },

    #[error("file browser section for module {module:?} not found within {timeout:?}")]
    ModuleSearchTimedOut { module: String, timeout: Duration },

    #[error("file {filename:?} not found")]
    FileNotFound { filename: String },

    #[error("action {action:?} not offered for the selected file")]
    ActionNotFound { action: String },

    #[error("{role} device bring-up failed: cannot determine {setting} state")]
    BringUp { role: String, setting: String },
}

impl NavigationError {
    /// Returns `true` when the device is merely somewhere unexpected.
    ///
    /// The caller may re-normalise with
    /// [`Navigator::go_to_main_screen`] and carry on.  Transport, decoding,
    /// configuration and bring-up errors are fatal for the session.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            NavigationError::NotReached { .. }
                | NavigationError::MenuScanTimedOut { .. }
                | NavigationError::ModuleNotFound { .. }
                | NavigationError::ModuleSearchTimedOut { .. }
                | NavigationError::FileNotFound { .. }
                | NavigationError::ActionNotFound { .. }
        )
    }
}

// ── Collaborator traits ───────────────────────────────────────────────────────

/// The device RPC session as seen by the navigator.
///
/// Infrastructure implementations wrap the real transport; test
/// implementations replay scripted screens and record inputs.
#[async_trait]
pub trait DeviceLink: Send + Sync {
    /// Asks the device to start streaming its screen.
    async fn start_screen_stream(&self) -> Result<(), LinkError>;

    /// Waits for the next packed framebuffer.
    async fn next_frame(&self) -> Result<Vec<u8>, LinkError>;

    /// Sends one input event.
    async fn send_input(&self, event: InputEvent) -> Result<(), LinkError>;
}

/// Persists frames for later inspection.
pub trait SnapshotStore: Send + Sync {
    /// Saves `frame` under `name` and returns where it went.
    fn save(&self, name: &str, frame: &Frame) -> Result<PathBuf, SnapshotError>;
}

// ── Configuration ─────────────────────────────────────────────────────────────

/// Direction to scroll while searching a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    Up,
    #[default]
    Down,
}

impl Direction {
    pub fn key(self) -> InputKey {
        match self {
            Direction::Up => InputKey::Up,
            Direction::Down => InputKey::Down,
        }
    }
}

/// Snapshot name used when a recognition times out.
pub const RECOGNITION_FAILURE_SNAPSHOT: &str = "recognition_failure";

/// Runtime settings of one navigator.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigatorConfig {
    /// Matches must score strictly above this.
    pub threshold: f64,
    /// Template that identifies the home screen.
    pub home_marker: String,
    /// Template of the "exit?" prompt that needs LEFT instead of BACK.
    pub exit_marker: String,
    /// Default timeout of [`Navigator::get_current_state`].
    pub state_timeout: Duration,
    /// Timeout of each recognition attempt inside a navigation loop.
    pub probe_timeout: Duration,
    /// Timeout of [`Navigator::wait_for`].
    pub wait_timeout: Duration,
    /// Default timeout of [`Navigator::go_to`].
    pub go_to_timeout: Duration,
    pub home_timeout: Duration,
    pub menu_scan_timeout: Duration,
    pub module_search_timeout: Duration,
    pub file_search_timeout: Duration,
    /// Pause after reaching the home screen; the device drops presses
    /// while its desktop animation runs.
    pub home_settle: Duration,
    pub browser_open_delay: Duration,
    /// Pause after opening the browser while stale headers scroll past.
    pub browser_header_delay: Duration,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            threshold: 0.99,
            home_marker: "SDcardIcon".to_string(),
            exit_marker: "ExitLeft".to_string(),
            state_timeout: Duration::from_secs(2),
            probe_timeout: Duration::from_millis(200),
            wait_timeout: Duration::from_secs(5),
            go_to_timeout: Duration::from_secs(20),
            home_timeout: Duration::from_secs(30),
            menu_scan_timeout: Duration::from_secs(30),
            module_search_timeout: Duration::from_secs(10),
            file_search_timeout: Duration::from_secs(15),
            home_settle: Duration::from_millis(1500),
            browser_open_delay: Duration::from_secs(1),
            browser_header_delay: Duration::from_millis(400),
        }
    }
}

impl NavigatorConfig {
    /// Same settings with every fixed pause and probe window set to zero.
    ///
    /// Each recognition attempt then captures exactly one frame, which is
    /// what a scripted device needs.
    pub fn without_delays(self) -> Self {
        Self {
            probe_timeout: Duration::ZERO,
            home_settle: Duration::ZERO,
            browser_open_delay: Duration::ZERO,
            browser_header_delay: Duration::ZERO,
            ..self
        }
    }
}

/// Creates the tracing span that tags everything one navigator logs.
pub fn session_span(device_name: &str) -> Span {
    info_span!("navigator", session = %Uuid::new_v4(), device = device_name)
}

fn names(matches: &[RecognitionMatch]) -> Vec<&str> {
    matches.iter().map(|m| m.name.as_str()).collect()
}

// ── Navigator ─────────────────────────────────────────────────────────────────

/// One navigation session bound to one device.
///
/// Owns the latest decoded frame, the template library and the settings.
/// Every method that talks to the device takes `&mut self` or `&self` and
/// awaits each request before issuing the next, so commands on the device
/// channel are never pipelined.
pub struct Navigator {
    device: Arc<dyn DeviceLink>,
    templates: Arc<TemplateLibrary>,
    renderer: Option<Arc<dyn TextRenderer>>,
    snapshots: Option<Arc<dyn SnapshotStore>>,
    recognizer: Recognizer,
    config: NavigatorConfig,
    frame: Frame,
    streaming: bool,
    span: Span,
}

impl Navigator {
    /// Creates a navigator; all logging goes under `span`.
    pub fn new(
        device: Arc<dyn DeviceLink>,
        templates: Arc<TemplateLibrary>,
        config: NavigatorConfig,
        span: Span,
    ) -> Self {
        Self {
            device,
            templates,
            renderer: None,
            snapshots: None,
            recognizer: Recognizer::new(config.threshold),
            config,
            frame: Frame::blank(),
            streaming: false,
            span,
        }
    }

    /// Enables text templates for targets without a stored bitmap.
    pub fn with_renderer(mut self, renderer: Arc<dyn TextRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Enables frame snapshots.
    pub fn with_snapshots(mut self, snapshots: Arc<dyn SnapshotStore>) -> Self {
        self.snapshots = Some(snapshots);
        self
    }

    pub fn config(&self) -> &NavigatorConfig {
        &self.config
    }

    pub fn templates(&self) -> &TemplateLibrary {
        &self.templates
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// The most recently decoded frame.
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    // ── Screen capture ────────────────────────────────────────────────────────

    /// Pulls and decodes the next frame, starting the stream on first use.
    pub async fn update_screen(&mut self) -> Result<&Frame, NavigationError> {
        if !self.streaming {
            self.device.start_screen_stream().await?;
            self.streaming = true;
            debug!(parent: &self.span, "screen stream started");
        }
        let raw = self.device.next_frame().await?;
        self.frame = decode_frame(&raw)?;
        Ok(&self.frame)
    }

    /// Recognises `library` in the current frame without capturing.
    pub fn recognize(&self, library: &TemplateLibrary, region: Region) -> Vec<RecognitionMatch> {
        self.recognizer.recognize(library, &self.frame, region)
    }

    /// Captures until at least one template matches or `timeout` elapses.
    ///
    /// Always captures at least once.  Returns an empty list on timeout.
    async fn poll_state(
        &mut self,
        library: &TemplateLibrary,
        timeout: Duration,
        region: Region,
    ) -> Result<Vec<RecognitionMatch>, NavigationError> {
        let start = Instant::now();
        loop {
            self.update_screen().await?;
            let found = self.recognize(library, region);
            if !found.is_empty() || start.elapsed() >= timeout {
                return Ok(found);
            }
            tokio::task::yield_now().await;
        }
    }

    /// Recognises the stored library until something matches.
    ///
    /// On timeout this logs an error, saves the last frame as
    /// [`RECOGNITION_FAILURE_SNAPSHOT`] when a snapshot store is configured,
    /// and returns an empty list.
    pub async fn get_current_state(
        &mut self,
        timeout: Duration,
        region: Region,
    ) -> Result<Vec<RecognitionMatch>, NavigationError> {
        let library = Arc::clone(&self.templates);
        self.get_current_state_in(&library, timeout, region).await
    }

    /// [`get_current_state`](Self::get_current_state) against an explicit
    /// library.
    #[instrument(parent = &self.span, skip_all, fields(timeout = ?timeout))]
    pub async fn get_current_state_in(
        &mut self,
        library: &TemplateLibrary,
        timeout: Duration,
        region: Region,
    ) -> Result<Vec<RecognitionMatch>, NavigationError> {
        let found = self.poll_state(library, timeout, region).await?;
        if found.is_empty() {
            error!("recognition timeout");
            self.save_failure_snapshot();
        } else {
            debug!(found = ?names(&found), "recognised");
        }
        Ok(found)
    }

    fn save_failure_snapshot(&self) {
        if let Some(store) = &self.snapshots {
            match store.save(RECOGNITION_FAILURE_SNAPSHOT, &self.frame) {
                Ok(path) => warn!(path = %path.display(), "failure snapshot saved"),
                Err(e) => warn!(error = %e, "failure snapshot not saved"),
            }
        }
    }

    /// Saves the current frame under `name`.
    pub fn save_screen(&self, name: &str) -> Result<PathBuf, NavigationError> {
        let store = self
            .snapshots
            .as_ref()
            .ok_or(SnapshotError::NotConfigured)?;
        let path = store.save(name, &self.frame)?;
        info!(parent: &self.span, path = %path.display(), "screen saved");
        Ok(path)
    }

    /// Polls until `target` is among the recognised states.
    ///
    /// Returns `Ok(false)` when the deadline passes; at least one attempt is
    /// always made.
    #[instrument(parent = &self.span, skip_all, fields(state = %target, timeout = ?timeout))]
    pub async fn wait_for_state(
        &mut self,
        target: &str,
        timeout: Duration,
    ) -> Result<bool, NavigationError> {
        let library = Arc::clone(&self.templates);
        let start = Instant::now();
        loop {
            let found = self
                .poll_state(&library, self.config.probe_timeout, Region::FULL)
                .await?;
            if found.iter().any(|m| m.name == target) {
                debug!("state reached");
                return Ok(true);
            }
            if start.elapsed() >= timeout {
                warn!("state not reached");
                return Ok(false);
            }
        }
    }

    /// [`wait_for_state`](Self::wait_for_state) with the configured
    /// `wait_timeout`.
    pub async fn wait_for(&mut self, target: &str) -> Result<bool, NavigationError> {
        let timeout = self.config.wait_timeout;
        self.wait_for_state(target, timeout).await
    }

    // ── Navigation ────────────────────────────────────────────────────────────

    /// Renders text templates for a target with no stored bitmap.
    fn synthesize(&self, target: &str) -> Result<TemplateLibrary, NavigationError> {
        let no_template = || NavigationError::NoTemplate {
            target: target.to_string(),
        };
        let renderer = self.renderer.as_ref().ok_or_else(no_template)?;
        let library = synthesize_variants(renderer.as_ref(), target);
        if library.is_empty() {
            return Err(no_template());
        }
        debug!(parent: &self.span, variants = library.len(), "text templates rendered");
        Ok(library)
    }

    /// Scrolls in `direction` until `target` shows up inside `region`.
    ///
    /// Targets without a stored template are rendered as text in several
    /// font variants, and any variant counts as a hit.
    ///
    /// # Errors
    ///
    /// [`NavigationError::NotReached`] when `timeout` elapses (recoverable),
    /// [`NavigationError::NoTemplate`] if the target cannot be rendered.
    #[instrument(parent = &self.span, skip_all, fields(state = %target, direction = ?direction, timeout = ?timeout))]
    pub async fn go_to(
        &mut self,
        target: &str,
        region: Region,
        direction: Direction,
        timeout: Duration,
    ) -> Result<(), NavigationError> {
        let stored = self.templates.contains(target);
        let library = if stored {
            Arc::clone(&self.templates)
        } else {
            info!("no stored template, rendering from text");
            Arc::new(self.synthesize(target)?)
        };
        info!("going to state");

        let start = Instant::now();
        loop {
            let found = self
                .poll_state(&library, self.config.probe_timeout, region)
                .await?;
            let reached = if stored {
                found.iter().any(|m| m.name == target)
            } else {
                !found.is_empty()
            };
            if reached {
                info!("state reached");
                return Ok(());
            }
            if start.elapsed() >= timeout {
                warn!("state not reached");
                return Err(NavigationError::NotReached {
                    target: target.to_string(),
                    timeout,
                });
            }
            self.press(PressDuration::Short, direction.key()).await?;
        }
    }

    /// [`go_to`](Self::go_to) with the configured default timeout, then OK.
    pub async fn open(
        &mut self,
        target: &str,
        region: Region,
        direction: Direction,
    ) -> Result<(), NavigationError> {
        let timeout = self.config.go_to_timeout;
        self.go_to(target, region, direction, timeout).await?;
        self.press_ok().await
    }

    // ── Press primitives ──────────────────────────────────────────────────────

    /// Sends one complete press of `key`.
    pub async fn press(&self, duration: PressDuration, key: InputKey) -> Result<(), NavigationError> {
        for event in duration.phases(key) {
            self.device.send_input(event).await?;
        }
        debug!(parent: &self.span, key = %key, ?duration, "press");
        Ok(())
    }

    /// [`press`](Self::press) with names as the device spells them
    /// (`"SHORT"`/`"LONG"`, `"OK"`, `"BACK"`, `"UP"`, ...).
    ///
    /// # Errors
    ///
    /// [`NavigationError::Configuration`] for an unknown name; nothing is
    /// sent in that case.
    pub async fn press_named(&self, duration: &str, button: &str) -> Result<(), NavigationError> {
        let duration: PressDuration = duration.parse()?;
        let key: InputKey = button.parse()?;
        self.press(duration, key).await
    }

    pub async fn press_up(&self) -> Result<(), NavigationError> {
        self.press(PressDuration::Short, InputKey::Up).await
    }

    pub async fn press_down(&self) -> Result<(), NavigationError> {
        self.press(PressDuration::Short, InputKey::Down).await
    }

    pub async fn press_left(&self) -> Result<(), NavigationError> {
        self.press(PressDuration::Short, InputKey::Left).await
    }

    pub async fn press_right(&self) -> Result<(), NavigationError> {
        self.press(PressDuration::Short, InputKey::Right).await
    }

    pub async fn press_ok(&self) -> Result<(), NavigationError> {
        self.press(PressDuration::Short, InputKey::Ok).await
    }

    pub async fn press_long_ok(&self) -> Result<(), NavigationError> {
        self.press(PressDuration::Long, InputKey::Ok).await
    }

    pub async fn press_back(&self) -> Result<(), NavigationError> {
        self.press(PressDuration::Short, InputKey::Back).await
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
