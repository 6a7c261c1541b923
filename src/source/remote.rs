//! Remote reader: store queries raced against a fixed time budget.
//!
//! Whichever settles first wins. When the budget elapses first, the store
//! future is dropped, so a late response can never reach the caller; the
//! cycle resolves to `Fallback(_, Timeout)` with a synthetic reading.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use salain_types::{AcquisitionResult, FallbackReason, Metric, Provenance, SensorReading};
use tracing::{debug, warn};

use super::store::{Store, StoreError, StoreRow};
use super::{AcquisitionSource, Seed, SyntheticGenerator};

/// Acquisition source backed by a remote [`Store`], with synthetic fallback.
#[derive(Debug)]
pub struct RemoteReader {
    store: Arc<dyn Store>,
    timeout: Duration,
    fallback: SyntheticGenerator,
    description: String,
}

impl RemoteReader {
    pub fn new(store: Arc<dyn Store>, timeout: Duration, fallback: SyntheticGenerator) -> Self {
        let description = format!("{} (timeout {}ms)", store.description(), timeout.as_millis());
        Self {
            store,
            timeout,
            fallback,
            description,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn fall_back(&mut self, reason: FallbackReason) -> AcquisitionResult {
        AcquisitionResult::Fallback(self.fallback.next_reading(), reason)
    }

    /// Convert a store row, pulling out-of-domain values back into range.
    ///
    /// Missing columns default to 0 first, so an absent temperature or TDS
    /// lands on its domain minimum rather than below it.
    fn row_to_reading(row: &StoreRow) -> SensorReading {
        let missing = row.missing_fields();
        if !missing.is_empty() {
            warn!(?missing, "store row missing fields, defaulting to 0");
        }
        let reading = row.to_reading();
        let out_of_domain: Vec<Metric> = reading
            .iter()
            .filter(|(metric, value)| !metric.definition().domain.contains(*value))
            .map(|(metric, _)| metric)
            .filter(|metric| !missing.contains(metric))
            .collect();
        if !out_of_domain.is_empty() {
            warn!(?out_of_domain, "store row outside sensor domain, clamping");
        }
        reading.clamped()
    }

    /// Fetch the current reading.
    pub async fn fetch_latest(&mut self) -> AcquisitionResult {
        match tokio::time::timeout(self.timeout, self.store.latest()).await {
            Ok(Ok(Some(row))) => {
                let reading = Self::row_to_reading(&row);
                debug!(recorded_at = ?row.recorded_at(), "store reading applied");
                self.fallback.observe(&reading);
                AcquisitionResult::Success(reading, row.model_output())
            }
            Ok(Ok(None)) => {
                warn!("store returned no rows, using synthetic reading");
                self.fall_back(FallbackReason::StoreError)
            }
            Ok(Err(e)) => {
                warn!(error = %e, "store query failed, using synthetic reading");
                self.fall_back(FallbackReason::StoreError)
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    "store query timed out, using synthetic reading"
                );
                self.fall_back(FallbackReason::Timeout)
            }
        }
    }

    /// Fetch up to `n` readings in chronological order (oldest first).
    pub async fn fetch_window(&mut self, n: usize) -> Result<Vec<SensorReading>, StoreError> {
        let rows = tokio::time::timeout(self.timeout, self.store.latest_n(n))
            .await
            .map_err(|_| StoreError::Timeout)??;

        if rows.is_empty() {
            return Err(StoreError::Empty);
        }

        // The store answers newest first
        let readings: Vec<SensorReading> =
            rows.iter().take(n).rev().map(Self::row_to_reading).collect();
        Ok(readings)
    }
}

#[async_trait]
impl AcquisitionSource for RemoteReader {
    async fn read(&mut self) -> AcquisitionResult {
        self.fetch_latest().await
    }

    async fn history_seed(&mut self, capacity: usize) -> Seed {
        match self.fetch_window(capacity).await {
            Ok(window) => {
                let missing = capacity.saturating_sub(window.len());
                if let Some(oldest) = window.first() {
                    self.fallback.observe(oldest);
                }
                // Short windows are padded at the old end with a walk that
                // ends next to the oldest stored reading.
                let mut readings = self.fallback.bootstrap(missing);
                readings.reverse();
                readings.extend(window.iter().copied());
                if let Some(newest) = window.last() {
                    self.fallback.observe(newest);
                }
                debug!(stored = window.len(), padded = missing, "history seeded from store");
                let provenance = if missing == 0 {
                    Provenance::Remote
                } else {
                    Provenance::Synthetic
                };
                Seed {
                    readings,
                    provenance,
                }
            }
            Err(e) => {
                warn!(error = %e, "history window unavailable, seeding synthetically");
                Seed {
                    readings: self.fallback.bootstrap(capacity),
                    provenance: Provenance::Synthetic,
                }
            }
        }
    }

    fn description(&self) -> &str {
        &self.description
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::testing::{row, FakeStore};

    fn reader(store: FakeStore) -> RemoteReader {
        RemoteReader::new(
            Arc::new(store),
            Duration::from_millis(3000),
            SyntheticGenerator::seeded(Vec::new(), 17),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_latest_success() {
        let reading = SensorReading::new(7.0, 24.0, 400.0, 5.0, 60.0, 40.0);
        let mut reader = reader(FakeStore::with_rows(vec![row(reading)]));

        let result = reader.fetch_latest().await;
        assert_eq!(result, AcquisitionResult::Success(reading, Default::default()));
        // Fallback walk continues from the last real value
        assert_eq!(reader.fallback.previous(), &reading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_latest_clamps_out_of_domain_row() {
        let wild = SensorReading::new(20.0, 55.0, 5000.0, 150.0, 300.0, 120.0);
        let mut reader = reader(FakeStore::with_rows(vec![row(wild)]));

        let result = reader.fetch_latest().await;
        let expected = SensorReading::new(14.0, 40.0, 1000.0, 100.0, 150.0, 100.0);
        assert_eq!(result, AcquisitionResult::Success(expected, Default::default()));
        assert!(result.reading().is_in_domain());
        assert_eq!(reader.fallback.previous(), &expected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_fields_land_on_domain_minimum() {
        let partial = StoreRow {
            ph: Some(7.0),
            flow_rate: Some(60.0),
            water_level: Some(40.0),
            ..Default::default()
        };
        let mut reader = reader(FakeStore::with_rows(vec![partial]));

        let result = reader.fetch_latest().await;
        assert_eq!(result.provenance(), Provenance::Remote);
        let reading = result.reading();
        assert_eq!(reading.temperature, 10.0);
        assert_eq!(reading.tds, 100.0);
        assert_eq!(reading.turbidity, 0.0);
        assert!(reading.is_in_domain());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_latest_times_out() {
        let reading = SensorReading::new(7.0, 24.0, 400.0, 5.0, 60.0, 40.0);
        let store = FakeStore {
            delay: Duration::from_millis(4500),
            ..FakeStore::with_rows(vec![row(reading)])
        };
        let mut reader = reader(store);

        let started = tokio::time::Instant::now();
        let result = reader.fetch_latest().await;
        assert_eq!(result.fallback_reason(), Some(FallbackReason::Timeout));
        assert_ne!(result.reading(), &reading);
        assert!(result.reading().is_in_domain());
        assert_eq!(started.elapsed(), Duration::from_millis(3000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_latest_store_error() {
        let store = FakeStore {
            fail: true,
            ..Default::default()
        };
        let mut reader = reader(store);
        let result = reader.fetch_latest().await;
        assert_eq!(result.fallback_reason(), Some(FallbackReason::StoreError));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_latest_empty_is_store_error() {
        let mut reader = reader(FakeStore::default());
        let result = reader.fetch_latest().await;
        assert_eq!(result.fallback_reason(), Some(FallbackReason::StoreError));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_window_is_chronological() {
        // Newest first, as the store returns them
        let rows: Vec<StoreRow> = (0..5)
            .rev()
            .map(|i| row(SensorReading::initial().with(Metric::Tds, 300.0 + i as f64)))
            .collect();
        let mut reader = reader(FakeStore::with_rows(rows));

        let window = reader.fetch_window(5).await.unwrap();
        let tds: Vec<f64> = window.iter().map(|r| r.tds).collect();
        assert_eq!(tds, vec![300.0, 301.0, 302.0, 303.0, 304.0]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_history_seed_pads_short_window() {
        let rows: Vec<StoreRow> = (0..3)
            .rev()
            .map(|i| row(SensorReading::initial().with(Metric::Tds, 500.0 + i as f64)))
            .collect();
        let mut reader = reader(FakeStore::with_rows(rows));

        let seed = reader.history_seed(20).await;
        assert_eq!(seed.readings.len(), 20);
        assert_eq!(seed.provenance, Provenance::Synthetic);
        let tail: Vec<f64> = seed.readings[17..].iter().map(|r| r.tds).collect();
        assert_eq!(tail, vec![500.0, 501.0, 502.0]);
        assert!(seed.readings.iter().all(SensorReading::is_in_domain));
    }

    #[tokio::test(start_paused = true)]
    async fn test_history_seed_full_window_is_remote() {
        let rows: Vec<StoreRow> = (0..20).map(|_| row(SensorReading::initial())).collect();
        let mut reader = reader(FakeStore::with_rows(rows));

        let seed = reader.history_seed(20).await;
        assert_eq!(seed.readings.len(), 20);
        assert_eq!(seed.provenance, Provenance::Remote);
    }

    #[tokio::test(start_paused = true)]
    async fn test_history_seed_timeout_is_synthetic() {
        let store = FakeStore {
            delay: Duration::from_secs(10),
            ..FakeStore::with_rows(vec![row(SensorReading::initial())])
        };
        let mut reader = reader(store);

        let seed = reader.history_seed(25).await;
        assert_eq!(seed.readings.len(), 25);
        assert_eq!(seed.provenance, Provenance::Synthetic);
    }
}
