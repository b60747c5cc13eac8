//! TOML bench configuration.
//!
//! The rig reads `bench.toml` from the working directory unless `--config`
//! names another file.  A missing file means "all defaults".
//!
//! # Example
//!
//! ```toml
//! [bench]
//! log_level = "debug"
//!
//! [navigator]
//! template_dir = "templates"
//! threshold = 0.99
//!
//! [navigator.fonts.primary]
//! path = "fonts/helvB08.ttf"
//! size = 8.0
//!
//! [gantry]
//! port = "/dev/ttyUSB0"
//!
//! [reader]
//! port = "/dev/ttyACM1"
//!
//! [[reader.slots]]
//! name = "nfc"
//! x = -925.0
//! y = -890.0
//! ```
//!
//! # Serde default values
//!
//! Every field is annotated with `#[serde(default = "some_fn")]`, so a file
//! only needs the settings that differ from the defaults.  Timings are stored
//! as whole milliseconds.

use std::path::{Path, PathBuf};
use std::time::Duration;

use bench_core::recognition::FontFace;
use bench_navigator::application::navigate::NavigatorConfig;
use bench_navigator::infrastructure::fonts::{FontLoadError, FontdueRenderer};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "bench.toml";

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct BenchConfig {
    #[serde(default)]
    pub bench: BenchSection,
    #[serde(default)]
    pub navigator: NavigatorSection,
    #[serde(default)]
    pub gantry: GantrySection,
    #[serde(default)]
    pub reader: ReaderSection,
    #[serde(default)]
    pub relay: RelaySection,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BenchSection {
    /// `tracing` level used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Screen recognition and navigation settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NavigatorSection {
    #[serde(default = "default_template_dir")]
    pub template_dir: PathBuf,
    #[serde(default = "default_snapshot_dir")]
    pub snapshot_dir: PathBuf,
    /// Matches must score strictly above this.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Upscale factor of preview images.
    #[serde(default = "default_scale")]
    pub scale: u32,
    /// Write preview and failure snapshots.
    #[serde(default)]
    pub debug: bool,
    #[serde(default = "default_home_marker")]
    pub home_marker: String,
    #[serde(default = "default_exit_marker")]
    pub exit_marker: String,
    #[serde(default = "default_state_timeout_ms")]
    pub state_timeout_ms: u64,
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
    #[serde(default = "default_wait_timeout_ms")]
    pub wait_timeout_ms: u64,
    #[serde(default = "default_go_to_timeout_ms")]
    pub go_to_timeout_ms: u64,
    #[serde(default = "default_home_timeout_ms")]
    pub home_timeout_ms: u64,
    #[serde(default = "default_menu_scan_timeout_ms")]
    pub menu_scan_timeout_ms: u64,
    #[serde(default = "default_module_search_timeout_ms")]
    pub module_search_timeout_ms: u64,
    #[serde(default = "default_file_search_timeout_ms")]
    pub file_search_timeout_ms: u64,
    #[serde(default = "default_home_settle_ms")]
    pub home_settle_ms: u64,
    #[serde(default)]
    pub fonts: FontsSection,
}

/// Outline fonts standing in for the device's font roles.  A role without
/// a font is simply not used for text templates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct FontsSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<FontEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<FontEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyboard: Option<FontEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub big_numbers: Option<FontEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FontEntry {
    pub path: PathBuf,
    /// Pixel size.
    pub size: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GantrySection {
    #[serde(default = "default_gantry_port")]
    pub port: String,
    #[serde(default = "default_baud")]
    pub baud: u32,
    #[serde(default = "default_travel")]
    pub size_x: f64,
    #[serde(default = "default_travel")]
    pub size_y: f64,
    /// Feed rate of operator moves.
    #[serde(default = "default_feed")]
    pub feed: u32,
    #[serde(default = "default_home_timeout_ms")]
    pub home_timeout_ms: u64,
    #[serde(default = "default_move_timeout_ms")]
    pub move_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReaderSection {
    #[serde(default = "default_reader_port")]
    pub port: String,
    #[serde(default = "default_baud")]
    pub baud: u32,
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
    #[serde(default = "default_slots")]
    pub slots: Vec<SlotEntry>,
}

/// A reader's parking place in bench coordinates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlotEntry {
    pub name: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RelaySection {
    #[serde(default = "default_relay_port")]
    pub port: String,
    #[serde(default = "default_baud")]
    pub baud: u32,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_template_dir() -> PathBuf {
    PathBuf::from("templates")
}
fn default_snapshot_dir() -> PathBuf {
    PathBuf::from("snapshots")
}
fn default_threshold() -> f64 {
    0.99
}
fn default_scale() -> u32 {
    8
}
fn default_home_marker() -> String {
    "SDcardIcon".to_string()
}
fn default_exit_marker() -> String {
    "ExitLeft".to_string()
}
fn default_state_timeout_ms() -> u64 {
    2_000
}
fn default_probe_timeout_ms() -> u64 {
    200
}
fn default_wait_timeout_ms() -> u64 {
    5_000
}
fn default_go_to_timeout_ms() -> u64 {
    20_000
}
fn default_home_timeout_ms() -> u64 {
    30_000
}
fn default_menu_scan_timeout_ms() -> u64 {
    30_000
}
fn default_module_search_timeout_ms() -> u64 {
    10_000
}
fn default_file_search_timeout_ms() -> u64 {
    15_000
}
fn default_home_settle_ms() -> u64 {
    1_500
}
fn default_gantry_port() -> String {
    "/dev/ttyUSB0".to_string()
}
fn default_reader_port() -> String {
    "/dev/ttyACM1".to_string()
}
fn default_relay_port() -> String {
    "/dev/ttyUSB1".to_string()
}
fn default_baud() -> u32 {
    115_200
}
fn default_travel() -> f64 {
    900.0
}
fn default_feed() -> u32 {
    3_000
}
fn default_move_timeout_ms() -> u64 {
    60_000
}
fn default_read_timeout_ms() -> u64 {
    100
}
fn default_slots() -> Vec<SlotEntry> {
    [("nfc", -925.0, -890.0), ("em_hid", -665.0, -875.0), ("indala", -925.0, -635.0)]
        .into_iter()
        .map(|(name, x, y)| SlotEntry {
            name: name.to_string(),
            x,
            y,
        })
        .collect()
}

impl Default for BenchSection {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for NavigatorSection {
    fn default() -> Self {
        Self {
            template_dir: default_template_dir(),
            snapshot_dir: default_snapshot_dir(),
            threshold: default_threshold(),
            scale: default_scale(),
            debug: false,
            home_marker: default_home_marker(),
            exit_marker: default_exit_marker(),
            state_timeout_ms: default_state_timeout_ms(),
            probe_timeout_ms: default_probe_timeout_ms(),
            wait_timeout_ms: default_wait_timeout_ms(),
            go_to_timeout_ms: default_go_to_timeout_ms(),
            home_timeout_ms: default_home_timeout_ms(),
            menu_scan_timeout_ms: default_menu_scan_timeout_ms(),
            module_search_timeout_ms: default_module_search_timeout_ms(),
            file_search_timeout_ms: default_file_search_timeout_ms(),
            home_settle_ms: default_home_settle_ms(),
            fonts: FontsSection::default(),
        }
    }
}

impl Default for GantrySection {
    fn default() -> Self {
        Self {
            port: default_gantry_port(),
            baud: default_baud(),
            size_x: default_travel(),
            size_y: default_travel(),
            feed: default_feed(),
            home_timeout_ms: default_home_timeout_ms(),
            move_timeout_ms: default_move_timeout_ms(),
        }
    }
}

impl Default for ReaderSection {
    fn default() -> Self {
        Self {
            port: default_reader_port(),
            baud: default_baud(),
            read_timeout_ms: default_read_timeout_ms(),
            slots: default_slots(),
        }
    }
}

impl Default for RelaySection {
    fn default() -> Self {
        Self {
            port: default_relay_port(),
            baud: default_baud(),
        }
    }
}

impl NavigatorSection {
    /// Runtime navigator settings.  Settings with no file entry keep the
    /// navigator's own defaults.
    pub fn to_navigator_config(&self) -> NavigatorConfig {
        let ms = Duration::from_millis;
        NavigatorConfig {
            threshold: self.threshold,
            home_marker: self.home_marker.clone(),
            exit_marker: self.exit_marker.clone(),
            state_timeout: ms(self.state_timeout_ms),
            probe_timeout: ms(self.probe_timeout_ms),
            wait_timeout: ms(self.wait_timeout_ms),
            go_to_timeout: ms(self.go_to_timeout_ms),
            home_timeout: ms(self.home_timeout_ms),
            menu_scan_timeout: ms(self.menu_scan_timeout_ms),
            module_search_timeout: ms(self.module_search_timeout_ms),
            file_search_timeout: ms(self.file_search_timeout_ms),
            home_settle: ms(self.home_settle_ms),
            ..NavigatorConfig::default()
        }
    }
}

impl FontsSection {
    /// Loads every configured face into one renderer.
    pub fn renderer(&self) -> Result<FontdueRenderer, FontLoadError> {
        let mut renderer = FontdueRenderer::new();
        let faces = [
            (FontFace::Primary, &self.primary),
            (FontFace::Secondary, &self.secondary),
            (FontFace::Keyboard, &self.keyboard),
            (FontFace::BigNumbers, &self.big_numbers),
        ];
        for (face, entry) in faces {
            if let Some(entry) = entry {
                renderer.add_face_file(face, &entry.path, entry.size)?;
            }
        }
        Ok(renderer)
    }
}

impl ReaderSection {
    pub fn slot(&self, name: &str) -> Option<&SlotEntry> {
        self.slots.iter().find(|s| s.name == name)
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Loads the configuration at `path`, or the defaults if it does not exist.
///
/// # Errors
///
/// [`ConfigError::Io`] for file-system errors other than "not found",
/// [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<BenchConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BenchConfig::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Writes `config` to `path`, creating the parent directory if needed.
pub fn save_config(path: &Path, config: &BenchConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
