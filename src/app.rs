//! Application state and interaction logic for the dashboard.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::Utc;
use tokio::runtime::Handle;
use tracing::{info, warn};

use crate::scheduler::{AcquisitionState, Scheduler};
use crate::snapshot::{SnapshotBuilder, TelemetrySnapshot};
use crate::ui::Theme;

/// How long a status message stays visible.
const STATUS_MESSAGE_TTL: Duration = Duration::from_secs(3);

/// Main application state.
pub struct App {
    pub running: bool,
    pub show_help: bool,
    pub show_telemetry: bool,
    /// Vertical scroll offset of the telemetry overlay.
    pub telemetry_scroll: u16,

    scheduler: Scheduler,
    runtime: Handle,
    snapshots: SnapshotBuilder,
    export_dir: PathBuf,

    /// Copy of the scheduler state taken at the last refresh.
    pub state: AcquisitionState,
    /// When the copy last changed.
    pub last_updated: Instant,

    // UI
    pub theme: Theme,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Instant)>,
}

impl App {
    /// Create a new App over a bootstrapped scheduler.
    ///
    /// `runtime` is used to run manual refresh cycles without blocking the
    /// render loop.
    pub fn new(
        scheduler: Scheduler,
        runtime: Handle,
        snapshots: SnapshotBuilder,
        export_dir: PathBuf,
        theme: Theme,
    ) -> Self {
        let state = scheduler.state();
        Self {
            running: true,
            show_help: false,
            show_telemetry: false,
            telemetry_scroll: 0,
            scheduler,
            runtime,
            snapshots,
            export_dir,
            state,
            last_updated: Instant::now(),
            theme,
            status_message: None,
        }
    }

    /// Returns a description of the acquisition source.
    pub fn source_description(&self) -> &str {
        self.scheduler.description()
    }

    pub fn snapshots(&self) -> &SnapshotBuilder {
        &self.snapshots
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired.
    pub fn get_status_message(&self) -> Option<&str> {
        if let Some((msg, time)) = &self.status_message {
            if time.elapsed() < STATUS_MESSAGE_TTL {
                return Some(msg);
            }
        }
        None
    }

    /// Pull the latest state from the scheduler.
    ///
    /// Returns true if a new cycle was applied (or the scheduler stopped)
    /// since the previous refresh.
    pub fn refresh_state(&mut self) -> bool {
        let state = self.scheduler.state();
        let changed = state.cycles() != self.state.cycles()
            || state.is_running() != self.state.is_running();
        self.state = state;
        if changed {
            self.last_updated = Instant::now();
        }
        changed
    }

    /// Run one acquisition cycle now, in the background.
    pub fn request_refresh(&mut self) {
        let scheduler = self.scheduler.clone();
        self.runtime.spawn(async move {
            let outcome = scheduler.tick().await;
            info!(?outcome, "manual refresh");
        });
        self.set_status_message("Refresh requested".to_string());
    }

    /// Raw-telemetry payload for the current state.
    pub fn telemetry(&self) -> TelemetrySnapshot {
        self.snapshots.telemetry(&self.state, Utc::now())
    }

    /// Telemetry payload as pretty-printed JSON.
    pub fn telemetry_json(&self) -> String {
        serde_json::to_string_pretty(&self.telemetry())
            .unwrap_or_else(|e| format!("failed to encode telemetry: {e}"))
    }

    /// Write the export file and report the outcome in the status bar.
    pub fn export(&mut self) -> Result<PathBuf> {
        let result = self
            .snapshots
            .write_export(&self.state, &self.export_dir, Utc::now());
        match &result {
            Ok(path) => {
                info!(path = %path.display(), "exported stats");
                self.set_status_message(format!("Exported to {}", path.display()));
            }
            Err(e) => {
                warn!(error = %e, "export failed");
                self.set_status_message(format!("Export failed: {e}"));
            }
        }
        result
    }

    /// Toggle the help overlay.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Toggle the raw-telemetry overlay.
    pub fn toggle_telemetry(&mut self) {
        self.show_telemetry = !self.show_telemetry;
        self.telemetry_scroll = 0;
    }

    pub fn scroll_telemetry(&mut self, delta: i32) {
        let next = i32::from(self.telemetry_scroll) + delta;
        self.telemetry_scroll = next.clamp(0, i32::from(u16::MAX)) as u16;
    }

    /// Close whichever overlay is open. Returns false if none was.
    pub fn close_overlay(&mut self) -> bool {
        if self.show_telemetry {
            self.show_telemetry = false;
            return true;
        }
        if self.show_help {
            self.show_help = false;
            return true;
        }
        false
    }

    /// Signal the application to quit.
    pub fn quit(&mut self) {
        self.running = false;
    }
}
