//! # salain
//!
//! Telemetry acquisition engine and terminal dashboard for the S.A.L.A.I.N.
//! water-treatment sensor array.
//!
//! Readings come from a remote store when one is configured and answers in
//! time, and from a synthetic generator otherwise. Every reading is
//! classified, appended to a bounded per-metric history, and exposed as a
//! raw-telemetry payload and an exportable stats document.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  ┌──────────┐  read()  ┌───────────┐  state()  ┌──────────┐  │
//! │  │  source  │◀─────────│ scheduler │──────────▶│   app    │  │
//! │  │ (input)  │          │  (owns    │           │  + ui    │  │
//! │  └────┬─────┘          │   state)  │           └────┬─────┘  │
//! │       │                └─────┬─────┘                │        │
//! │  RemoteReader                │                 snapshot      │
//! │  SyntheticSource           data                (telemetry,   │
//! │                     (history, status)           export)      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`source`]**: the [`AcquisitionSource`] trait with the remote reader
//!   (store + timeout + synthetic fallback) and the synthetic-only source
//! - **[`scheduler`]**: the periodic acquisition loop; owns the
//!   [`AcquisitionState`] and guarantees cycles never overlap
//! - **[`data`]**: bounded history with sparkline levels, metric status,
//!   classification and overflow projection
//! - **[`snapshot`]**: raw-telemetry payload and export document
//! - **[`settings`]**: layered configuration (file, environment, CLI)
//! - **[`app`]**, **[`events`]**, **[`ui`]**: the terminal dashboard
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Synthetic data, terminal dashboard
//! salain
//!
//! # Remote store, one telemetry line per cycle
//! SALAIN_STORE__URL=https://example.supabase.co salain --headless
//!
//! # Write the stats export and exit
//! salain --export --export-dir /tmp
//! ```
//!
//! ### As a library
//!
//! ```
//! use std::time::Duration;
//! use salain::{Classifier, Scheduler, SyntheticGenerator, SyntheticSource};
//!
//! # tokio_test::block_on(async {
//! let source = SyntheticSource::new(SyntheticGenerator::seeded(Vec::new(), 7));
//! let scheduler = Scheduler::bootstrap(
//!     Box::new(source),
//!     20,
//!     Duration::from_secs(5),
//!     Classifier::seeded(7),
//! )
//! .await;
//!
//! scheduler.tick().await;
//! let state = scheduler.state();
//! assert_eq!(state.cycles(), 1);
//! assert_eq!(state.history().capacity(), 20);
//! # });
//! ```

pub mod app;
pub mod data;
pub mod events;
pub mod scheduler;
pub mod settings;
pub mod snapshot;
pub mod source;
pub mod ui;

// Re-export main types for convenience
pub use app::App;
pub use data::{Classifier, History, SystemStatus};
pub use scheduler::{AcquisitionState, Scheduler, SchedulerHandle, TickOutcome};
pub use settings::Settings;
pub use snapshot::{ExportDocument, SnapshotBuilder, TelemetrySnapshot};
pub use source::{
    AcquisitionSource, RemoteReader, RestStore, Store, StoreError, SyntheticGenerator,
    SyntheticSource,
};
