//! Menu enumeration and return-to-home.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bench_core::{leading_match, Region};
use tracing::{error, info, instrument, warn};

use super::{NavigationError, Navigator};

/// Recorded for a menu entry that no template recognises.
pub const UNRECOGNIZED_ENTRY: &str = "<unrecognized>";

/// BACK presses sent before looking for the home screen; enough to leave
/// most applications outright.
const BLIND_BACK_PRESSES: usize = 3;

impl Navigator {
    /// Walks a circular menu downwards and lists its entries in order.
    ///
    /// The leading match of each step is recorded; a step with no match is
    /// recorded as [`UNRECOGNIZED_ENTRY`].  The scan stops the first time a
    /// recognised entry repeats, so an N-entry menu costs N presses.  Two
    /// entries drawn with the same icon end the scan early.
    ///
    /// # Errors
    ///
    /// [`NavigationError::MenuScanTimedOut`] if no entry repeats within the
    /// configured scan timeout (for example, a menu with no recognisable
    /// entry at all).
    #[instrument(parent = &self.span, skip_all)]
    pub async fn get_menu_list(&mut self) -> Result<Vec<String>, NavigationError> {
        let library = Arc::clone(&self.templates);
        let probe = self.config.probe_timeout;
        let timeout = self.config.menu_scan_timeout;
        info!("scanning menu list");

        // Let the menu-opening transition finish before the first sample.
        self.poll_state(&library, probe, Region::FULL).await?;

        let start = Instant::now();
        let mut entries: Vec<String> = Vec::new();
        loop {
            let found = self.poll_state(&library, probe, Region::FULL).await?;
            match leading_match(&found) {
                Some(m) if entries.contains(&m.name) => break,
                Some(m) => entries.push(m.name.clone()),
                None => {
                    warn!("menu entry has no template");
                    entries.push(UNRECOGNIZED_ENTRY.to_string());
                }
            }
            if start.elapsed() >= timeout {
                warn!(?entries, "menu scan timed out");
                return Err(NavigationError::MenuScanTimedOut { timeout });
            }
            self.press_down().await?;
        }

        info!(?entries, "menu scanned");
        Ok(entries)
    }

    /// Name of the leading entry of the list on screen.
    ///
    /// With `skip_parent`, the first row is taken to be a file browser's
    /// "parent folder" row: the cursor moves down once and the entry below
    /// it is returned instead.  `None` when nothing is recognised.
    pub async fn first_item(&mut self, skip_parent: bool) -> Result<Option<String>, NavigationError> {
        let timeout = self.config.state_timeout;
        let mut found = self.get_current_state(timeout, Region::FULL).await?;
        if skip_parent && !found.is_empty() {
            self.press_down().await?;
            found = self.get_current_state(timeout, Region::FULL).await?;
        }
        Ok(leading_match(&found).map(|m| m.name.clone()))
    }

    /// Backs out to the home screen.
    ///
    /// Sends a few blind BACK presses, then keeps pressing BACK (or LEFT
    /// while the exit prompt is showing) until the home marker is
    /// recognised, then waits for the home screen to settle.
    ///
    /// # Errors
    ///
    /// [`NavigationError::HomeScreenUnreachable`] when `timeout` elapses.
    /// The device is then in an unknown state.
    #[instrument(parent = &self.span, skip_all, fields(timeout = ?timeout))]
    pub async fn go_to_main_screen(&mut self, timeout: Duration) -> Result<(), NavigationError> {
        for _ in 0..BLIND_BACK_PRESSES {
            self.press_back().await?;
        }

        let library = Arc::clone(&self.templates);
        let probe = self.config.probe_timeout;
        let start = Instant::now();
        loop {
            let found = self.poll_state(&library, probe, Region::FULL).await?;
            if found.iter().any(|m| m.name == self.config.home_marker) {
                break;
            }
            if start.elapsed() >= timeout {
                error!("home screen not reached");
                return Err(NavigationError::HomeScreenUnreachable { timeout });
            }
            if found.iter().any(|m| m.name == self.config.exit_marker) {
                self.press_left().await?;
            } else {
                self.press_back().await?;
            }
        }

        info!("home screen reached");
        tokio::time::sleep(self.config.home_settle).await;
        Ok(())
    }
}
