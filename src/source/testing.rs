//! Scripted stores and sources shared by the crate's tests.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use salain_types::{AcquisitionResult, Metric, ModelOutput, Provenance, SensorReading};

use super::store::{Store, StoreError, StoreRow};
use super::{AcquisitionSource, Seed};

/// Store answering every query after `delay` with `rows` (newest first).
#[derive(Debug, Default)]
pub(crate) struct FakeStore {
    pub rows: Vec<StoreRow>,
    pub delay: Duration,
    pub fail: bool,
}

impl FakeStore {
    pub fn with_rows(rows: Vec<StoreRow>) -> Self {
        Self {
            rows,
            ..Default::default()
        }
    }

    async fn respond(&self) -> Result<(), StoreError> {
        tokio::time::sleep(self.delay).await;
        if self.fail {
            return Err(StoreError::Http("API returned status 500".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Store for FakeStore {
    async fn latest(&self) -> Result<Option<StoreRow>, StoreError> {
        self.respond().await?;
        Ok(self.rows.first().cloned())
    }

    async fn latest_n(&self, n: usize) -> Result<Vec<StoreRow>, StoreError> {
        self.respond().await?;
        Ok(self.rows.iter().take(n).cloned().collect())
    }

    fn description(&self) -> &str {
        "store: fake"
    }
}

/// A fully populated store row for `reading`.
pub(crate) fn row(reading: SensorReading) -> StoreRow {
    StoreRow {
        ph: Some(reading.ph),
        temperature: Some(reading.temperature),
        tds: Some(reading.tds),
        turbidity: Some(reading.turbidity),
        flow_rate: Some(reading.flow_rate),
        water_level: Some(reading.water_level),
        ..Default::default()
    }
}

/// Source whose reads succeed after scripted delays.
///
/// Each read pops the next delay (zero once the script runs out) and returns
/// the initial reading with TDS set to a counter.
#[derive(Debug)]
pub(crate) struct ScriptedSource {
    pub delays: VecDeque<Duration>,
    pub next_tds: f64,
}

impl ScriptedSource {
    pub fn new(delays: impl IntoIterator<Item = Duration>, first_tds: f64) -> Self {
        Self {
            delays: delays.into_iter().collect(),
            next_tds: first_tds,
        }
    }
}

#[async_trait]
impl AcquisitionSource for ScriptedSource {
    async fn read(&mut self) -> AcquisitionResult {
        let delay = self.delays.pop_front().unwrap_or_default();
        tokio::time::sleep(delay).await;
        let reading = SensorReading::initial().with(Metric::Tds, self.next_tds);
        self.next_tds += 1.0;
        AcquisitionResult::Success(reading, ModelOutput::default())
    }

    async fn history_seed(&mut self, capacity: usize) -> Seed {
        Seed {
            readings: vec![SensorReading::initial(); capacity],
            provenance: Provenance::Remote,
        }
    }

    fn description(&self) -> &str {
        "scripted"
    }
}
