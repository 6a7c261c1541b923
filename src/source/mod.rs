//! Acquisition source abstraction.
//!
//! The scheduler never knows whether readings come from a remote store or
//! from the synthetic generator: both implement [`AcquisitionSource`] and are
//! chosen once, at configuration time.

mod remote;
mod store;
mod synthetic;

#[cfg(test)]
pub(crate) mod testing;

pub use remote::RemoteReader;
pub use store::{RestStore, RestStoreBuilder, Store, StoreError, StoreRow};
pub use synthetic::{random_walk_step, SyntheticGenerator, SyntheticSource, DEMO_REPLAY};

use std::fmt::Debug;

use async_trait::async_trait;
use salain_types::{AcquisitionResult, Provenance, SensorReading};

/// Initial history values handed to the history buffers at bootstrap.
#[derive(Debug, Clone, PartialEq)]
pub struct Seed {
    /// Chronological, oldest first.
    pub readings: Vec<SensorReading>,
    /// `Remote` only when every seeded reading came from the store.
    pub provenance: Provenance,
}

/// Trait for obtaining one reading per acquisition cycle.
///
/// Implementations never fail: a broken or absent store is expressed as
/// [`AcquisitionResult::Fallback`] carrying a synthetic reading.
///
/// # Example
///
/// ```
/// use salain::source::{AcquisitionSource, SyntheticGenerator, SyntheticSource};
///
/// # tokio_test::block_on(async {
/// let mut source = SyntheticSource::new(SyntheticGenerator::random_walk());
/// let result = source.read().await;
/// assert!(result.reading().is_in_domain());
/// # });
/// ```
#[async_trait]
pub trait AcquisitionSource: Send + Debug {
    /// Obtain the reading for the current cycle.
    async fn read(&mut self) -> AcquisitionResult;

    /// Produce exactly `capacity` chronological readings to fill history.
    async fn history_seed(&mut self, capacity: usize) -> Seed;

    /// Returns a human-readable description of the source.
    ///
    /// Used for display in the dashboard status bar.
    fn description(&self) -> &str;
}
