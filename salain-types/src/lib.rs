//! # salain-types
//!
//! Core types for water-treatment sensor telemetry. This crate defines the
//! static metric domain (units, valid ranges, fluctuation variance, status
//! thresholds) and the values that flow through the acquisition engine:
//! readings, acquisition results and classifications.
//!
//! ## Features
//!
//! - `serde`: JSON (or any serde format) serialization of every public type
//!
//! ## Example
//!
//! ```rust
//! use salain_types::{Metric, SensorReading, StatusTag};
//!
//! let reading = SensorReading::new(9.2, 24.0, 850.0, 10.0, 60.0, 40.0);
//!
//! assert_eq!(Metric::Ph.definition().status_of(reading.ph), StatusTag::Critical);
//! assert_eq!(Metric::Tds.definition().status_of(reading.tds), StatusTag::Warning);
//! assert!(reading.is_in_domain());
//! ```

mod classification;
mod metric;
mod reading;

pub use classification::*;
pub use metric::*;
pub use reading::*;
