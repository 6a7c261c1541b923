//! Derived state: rolling history and status/classification.
//!
//! ## Submodules
//!
//! - [`history`]: Fixed-capacity per-metric series for sparklines and export
//! - [`status`]: Status tags, classification, overflow alert and system status
//!
//! ## Data Flow
//!
//! ```text
//! AcquisitionResult
//!        │
//!        ├──▶ History::append() (one sample per metric)
//!        │
//!        └──▶ Classifier::assess() ──▶ Assessment (label, confidence, forecast)
//! ```

pub mod history;
pub mod status;

pub use history::{History, HistorySeries, DEFAULT_CAPACITY, MAX_CAPACITY, MIN_CAPACITY};
pub use status::{
    classify, overflow_alert, status_of, Assessment, Classifier, OverflowAlert, SystemStatus,
    OVERFLOW_WARNING_LEVEL,
};
