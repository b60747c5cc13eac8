//! File-browser sequences.
//!
//! The device's file browser opens with DOWN from the home screen.  Its top
//! strip shows one section header per application; RIGHT moves to the next
//! section, and the list cycles.  Below the header, DOWN scrolls the files
//! of the section, and OK on a file opens an action submenu.
//!
//! Opening or deleting a file runs three stages, and a failed stage stops
//! the sequence:
//!
//! 1. page RIGHT through the headers until the module's header shows,
//! 2. scroll DOWN to the file and press OK,
//! 3. scroll to the action and press OK.

use std::sync::Arc;
use std::time::Instant;

use bench_core::{leading_match, RecognitionMatch, Region};
use tracing::{info, instrument, warn};

use super::{Direction, NavigationError, Navigator};

/// Strip at the top of the browser that holds the section header.
pub const HEADER_REGION: Region = Region::new(0, 16, 0, 128);

/// File list below the header (overlaps the header by one row).
pub const FILE_LIST_REGION: Region = Region::new(15, 64, 0, 128);

/// Template name of the "Run in app" action.
pub const RUN_IN_APP_ACTION: &str = "browser_Run in app";

/// Template name of the "Delete" action.
pub const DELETE_ACTION: &str = "browser_Delete";

/// Section header templates are named `browser_head_<module>`.
const HEADER_PREFIX: &str = "browser_head_";

impl Navigator {
    /// Pages through browser sections until `module`'s header shows.
    ///
    /// Only header templates take part, so an unrelated icon in the header
    /// strip cannot end the search.
    async fn find_section(&mut self, module: &str) -> Result<(), NavigationError> {
        let wanted = format!("{HEADER_PREFIX}{module}");
        let library = Arc::clone(&self.templates);
        let probe = self.config.probe_timeout;
        let timeout = self.config.module_search_timeout;

        let mut seen: Vec<String> = Vec::new();
        let start = Instant::now();
        loop {
            let headers: Vec<RecognitionMatch> = self
                .poll_state(&library, probe, HEADER_REGION)
                .await?
                .into_iter()
                .filter(|m| m.name.starts_with(HEADER_PREFIX))
                .collect();
            let leading = leading_match(&headers).map(|m| m.name.clone());
            match &leading {
                Some(name) if *name == wanted => return Ok(()),
                Some(name) if seen.contains(name) => {
                    warn!(?seen, "module not found");
                    return Err(NavigationError::ModuleNotFound {
                        module: module.to_string(),
                    });
                }
                _ => {}
            }
            if start.elapsed() >= timeout {
                warn!(?seen, "module search timed out");
                return Err(NavigationError::ModuleSearchTimedOut {
                    module: module.to_string(),
                    timeout,
                });
            }
            if let Some(name) = leading {
                seen.push(name);
                self.press_right().await?;
            }
        }
    }

    /// Opens the browser at `module`'s section and selects `filename`.
    async fn select_file(&mut self, module: &str, filename: &str) -> Result<(), NavigationError> {
        let home_timeout = self.config.home_timeout;
        self.go_to_main_screen(home_timeout).await?;
        tokio::time::sleep(self.config.browser_open_delay).await;
        self.press_down().await?;
        tokio::time::sleep(self.config.browser_header_delay).await;

        self.find_section(module).await?;

        let timeout = self.config.file_search_timeout;
        match self
            .go_to(filename, FILE_LIST_REGION, Direction::Down, timeout)
            .await
        {
            Ok(()) => {}
            Err(NavigationError::NotReached { .. }) => {
                warn!("file not found");
                return Err(NavigationError::FileNotFound {
                    filename: filename.to_string(),
                });
            }
            Err(e) => return Err(e),
        }
        self.press_ok().await
    }

    /// Picks `action` from the submenu of the selected file.
    async fn run_file_action(&mut self, action: &str) -> Result<(), NavigationError> {
        let timeout = self.config.go_to_timeout;
        match self
            .go_to(action, FILE_LIST_REGION, Direction::Down, timeout)
            .await
        {
            Ok(()) => {}
            Err(NavigationError::NotReached { .. }) => {
                return Err(NavigationError::ActionNotFound {
                    action: action.to_string(),
                })
            }
            Err(e) => return Err(e),
        }
        self.press_ok().await
    }

    /// Opens `filename` from `module`'s browser section in its application.
    ///
    /// # Errors
    ///
    /// The first failing stage decides the error:
    /// [`NavigationError::HomeScreenUnreachable`],
    /// [`NavigationError::ModuleNotFound`] /
    /// [`NavigationError::ModuleSearchTimedOut`],
    /// [`NavigationError::FileNotFound`] or
    /// [`NavigationError::ActionNotFound`].
    #[instrument(parent = &self.span, skip_all, fields(section = %module, file = %filename))]
    pub async fn open_file(&mut self, module: &str, filename: &str) -> Result<(), NavigationError> {
        info!("opening file");
        self.select_file(module, filename).await?;
        self.run_file_action(RUN_IN_APP_ACTION).await?;
        info!("file opened");
        Ok(())
    }

    /// Deletes `filename` from `module`'s browser section, confirms, and
    /// returns to the home screen.
    ///
    /// # Errors
    ///
    /// As for [`open_file`](Self::open_file).
    #[instrument(parent = &self.span, skip_all, fields(section = %module, file = %filename))]
    pub async fn delete_file(&mut self, module: &str, filename: &str) -> Result<(), NavigationError> {
        info!("deleting file");
        self.select_file(module, filename).await?;
        self.run_file_action(DELETE_ACTION).await?;
        // The confirmation dialog puts "Delete" on the right button.
        self.press_right().await?;
        info!("file deleted");
        let home_timeout = self.config.home_timeout;
        self.go_to_main_screen(home_timeout).await
    }
}
