//! Use case: prepare a freshly connected device for a bench run.
//!
//! Every device on the bench, whatever its role, needs Bluetooth and debug
//! mode switched on.  Both live in the Settings menu as toggle rows whose
//! icon shows the current state:
//!
//! ```text
//!   home ─OK─► apps ─► Settings ─OK─► Bluetooth ─OK─► [BluetoothIsON|OFF]
//!                           │
//!                           └──BACK── System ─OK─► [DebugIsON|OFF]
//! ```
//!
//! A toggle that is already on is left alone; one that is off is flipped
//! with RIGHT.  If neither icon shows, the device is not in a state the bench
//! understands and bring-up stops.

use std::fmt;

use bench_core::Region;
use tracing::{info, instrument};

use crate::application::navigate::{Direction, NavigationError, Navigator};

pub const BLUETOOTH_ON: &str = "BluetoothIsON";
pub const BLUETOOTH_OFF: &str = "BluetoothIsOFF";
pub const DEBUG_ON: &str = "DebugIsON";
pub const DEBUG_OFF: &str = "DebugIsOFF";

/// What a device does on the bench.  Bring-up is the same for every role;
/// the role tags logs and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceRole {
    /// The device running the application under test.
    Main,
    /// A device acting as a card reader.
    Reader,
    /// A device emulating a key or card.
    Key,
}

impl DeviceRole {
    pub fn as_str(self) -> &'static str {
        match self {
            DeviceRole::Main => "main",
            DeviceRole::Reader => "reader",
            DeviceRole::Key => "key",
        }
    }
}

impl fmt::Display for DeviceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of one settings toggle as read from its menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Toggle {
    On,
    Off,
}

fn read_toggle(entries: &[String], on: &str, off: &str) -> Option<Toggle> {
    if entries.iter().any(|e| e == on) {
        Some(Toggle::On)
    } else if entries.iter().any(|e| e == off) {
        Some(Toggle::Off)
    } else {
        None
    }
}

/// Switches Bluetooth and debug mode on.
///
/// # Errors
///
/// [`NavigationError::BringUp`] naming the setting whose state could not be
/// read, or whatever navigation error stopped the sequence first.
#[instrument(parent = nav.span(), skip_all, fields(role = %role))]
pub async fn bring_up(nav: &mut Navigator, role: DeviceRole) -> Result<(), NavigationError> {
    let unreadable = |setting: &str| NavigationError::BringUp {
        role: role.to_string(),
        setting: setting.to_string(),
    };
    info!("bringing up device");

    let home_timeout = nav.config().home_timeout;
    nav.go_to_main_screen(home_timeout).await?;
    nav.press_ok().await?;
    nav.open("Settings", Region::FULL, Direction::Down).await?;
    nav.open("Bluetooth", Region::FULL, Direction::Down).await?;

    let entries = nav.get_menu_list().await?;
    match read_toggle(&entries, BLUETOOTH_ON, BLUETOOTH_OFF) {
        Some(Toggle::On) => info!("bluetooth already on"),
        Some(Toggle::Off) => {
            info!("switching bluetooth on");
            nav.press_right().await?;
        }
        None => return Err(unreadable("Bluetooth")),
    }

    nav.press_back().await?;
    nav.open("System", Region::FULL, Direction::Down).await?;

    let entries = nav.get_menu_list().await?;
    match read_toggle(&entries, DEBUG_ON, DEBUG_OFF) {
        Some(Toggle::On) => info!("debug already on"),
        Some(Toggle::Off) => {
            info!("switching debug on");
            let timeout = nav.config().go_to_timeout;
            nav.go_to(DEBUG_OFF, Region::FULL, Direction::Down, timeout)
                .await?;
            nav.press_right().await?;
        }
        None => return Err(unreadable("Debug")),
    }

    info!("device ready");
    Ok(())
}
