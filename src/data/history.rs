//! Rolling per-metric history for trend display.

use std::collections::{BTreeMap, VecDeque};

use salain_types::{Metric, SensorReading};

/// Smallest accepted history capacity.
pub const MIN_CAPACITY: usize = 20;
/// Largest accepted history capacity.
pub const MAX_CAPACITY: usize = 30;
/// Capacity used when none is configured.
pub const DEFAULT_CAPACITY: usize = MIN_CAPACITY;

/// Fixed-capacity, chronologically ordered samples for one metric.
///
/// Once bootstrapped the series always holds exactly `capacity` values;
/// every append evicts the oldest one.
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySeries {
    values: VecDeque<f64>,
    capacity: usize,
}

impl HistorySeries {
    /// Create an empty series. A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Replace the contents with `values`, oldest first.
    ///
    /// Extra values are dropped from the old end. A short seed is padded at
    /// the old end by repeating its first value, so the series is full
    /// afterwards in every case.
    pub fn bootstrap<I>(&mut self, values: I)
    where
        I: IntoIterator<Item = f64>,
    {
        self.values.clear();
        for value in values {
            self.push(value);
        }
        let pad = self.values.front().copied().unwrap_or_default();
        while self.values.len() < self.capacity {
            self.values.push_front(pad);
        }
    }

    /// Append a sample, evicting the oldest when full.
    pub fn append(&mut self, value: f64) {
        self.push(value);
    }

    fn push(&mut self, value: f64) {
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.values.len() == self.capacity
    }

    /// Most recent sample.
    pub fn latest(&self) -> Option<f64> {
        self.values.back().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied()
    }

    /// Samples as a vector, oldest first.
    pub fn to_vec(&self) -> Vec<f64> {
        self.values.iter().copied().collect()
    }

    /// Normalize values to 0-7 for 8 bar levels.
    ///
    /// A flat series renders at mid height. Returns an empty Vec when there
    /// are fewer than two samples.
    pub fn sparkline(&self) -> Vec<u8> {
        if self.values.len() < 2 {
            return Vec::new();
        }

        let min = self.values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = self.values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let range = max - min;

        self.values
            .iter()
            .map(|&v| {
                if range <= f64::EPSILON {
                    3
                } else {
                    (((v - min) / range) * 7.0).round().clamp(0.0, 7.0) as u8
                }
            })
            .collect()
    }
}

/// One [`HistorySeries`] per metric, all sharing a capacity.
#[derive(Debug, Clone, PartialEq)]
pub struct History {
    series: BTreeMap<Metric, HistorySeries>,
    capacity: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl History {
    pub fn new(capacity: usize) -> Self {
        let series = Metric::ALL
            .into_iter()
            .map(|metric| (metric, HistorySeries::new(capacity)))
            .collect();
        Self {
            series,
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Fill every series from chronological readings.
    pub fn bootstrap(&mut self, readings: &[SensorReading]) {
        for (metric, series) in &mut self.series {
            series.bootstrap(readings.iter().map(|r| r.get(*metric)));
        }
    }

    /// Append one reading to every series.
    pub fn append(&mut self, reading: &SensorReading) {
        for (metric, series) in &mut self.series {
            series.append(reading.get(*metric));
        }
    }

    pub fn series(&self, metric: Metric) -> Option<&HistorySeries> {
        self.series.get(&metric)
    }

    /// Sparkline levels for one metric.
    pub fn sparkline(&self, metric: Metric) -> Vec<u8> {
        self.series(metric)
            .map(HistorySeries::sparkline)
            .unwrap_or_default()
    }

    /// True once every series holds `capacity` samples.
    pub fn is_bootstrapped(&self) -> bool {
        self.series.values().all(HistorySeries::is_full)
    }

    /// Plain per-metric vectors, oldest first, as written to the export file.
    pub fn to_export(&self) -> BTreeMap<Metric, Vec<f64>> {
        self.series
            .iter()
            .map(|(metric, series)| (*metric, series.to_vec()))
            .collect()
    }
}
