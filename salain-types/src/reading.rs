//! Sensor readings and the outcome of one acquisition cycle.

use core::fmt;

use crate::{Metric, ModelOutput};

/// One immutable sample of all six metrics.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct SensorReading {
    pub ph: f64,
    pub temperature: f64,
    pub tds: f64,
    pub turbidity: f64,
    pub flow_rate: f64,
    pub water_level: f64,
}

impl SensorReading {
    pub fn new(
        ph: f64,
        temperature: f64,
        tds: f64,
        turbidity: f64,
        flow_rate: f64,
        water_level: f64,
    ) -> Self {
        Self {
            ph,
            temperature,
            tds,
            turbidity,
            flow_rate,
            water_level,
        }
    }

    /// Reading made of every metric's `initial` value.
    pub fn initial() -> Self {
        let mut reading = Self::default();
        for metric in Metric::ALL {
            reading.set(metric, metric.definition().initial);
        }
        reading
    }

    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Ph => self.ph,
            Metric::Temperature => self.temperature,
            Metric::Tds => self.tds,
            Metric::Turbidity => self.turbidity,
            Metric::FlowRate => self.flow_rate,
            Metric::WaterLevel => self.water_level,
        }
    }

    pub fn set(&mut self, metric: Metric, value: f64) {
        let slot = match metric {
            Metric::Ph => &mut self.ph,
            Metric::Temperature => &mut self.temperature,
            Metric::Tds => &mut self.tds,
            Metric::Turbidity => &mut self.turbidity,
            Metric::FlowRate => &mut self.flow_rate,
            Metric::WaterLevel => &mut self.water_level,
        };
        *slot = value;
    }

    /// Copy of this reading with one metric replaced.
    pub fn with(mut self, metric: Metric, value: f64) -> Self {
        self.set(metric, value);
        self
    }

    /// Iterate `(metric, value)` pairs in display order.
    pub fn iter(&self) -> impl Iterator<Item = (Metric, f64)> + '_ {
        Metric::ALL.into_iter().map(move |m| (m, self.get(m)))
    }

    /// Whether every value lies inside its metric's domain.
    pub fn is_in_domain(&self) -> bool {
        self.iter().all(|(m, v)| m.definition().domain.contains(v))
    }

    /// Copy of this reading with every value clamped into its domain.
    pub fn clamped(&self) -> Self {
        let mut out = *self;
        for (metric, value) in self.iter() {
            out.set(metric, metric.definition().domain.clamp(value));
        }
        out
    }
}

/// Where the current reading came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Provenance {
    Remote,
    Synthetic,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provenance::Remote => "remote",
            Provenance::Synthetic => "synthetic",
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a cycle fell back to the synthetic generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FallbackReason {
    /// The store did not answer inside the time budget.
    Timeout,
    /// The store failed or returned nothing usable.
    StoreError,
    /// No store is configured; synthetic data is the intended source.
    NotConfigured,
}

impl FallbackReason {
    /// Whether this fallback means a configured store misbehaved.
    pub fn is_degraded(&self) -> bool {
        !matches!(self, FallbackReason::NotConfigured)
    }
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FallbackReason::Timeout => "store timeout",
            FallbackReason::StoreError => "store error",
            FallbackReason::NotConfigured => "no store configured",
        })
    }
}

/// The single outcome of one acquisition cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum AcquisitionResult {
    /// The store answered in time with a usable row.
    Success(SensorReading, ModelOutput),
    /// A synthetic reading stands in for the store.
    Fallback(SensorReading, FallbackReason),
}

impl AcquisitionResult {
    pub fn reading(&self) -> &SensorReading {
        match self {
            AcquisitionResult::Success(reading, _) | AcquisitionResult::Fallback(reading, _) => {
                reading
            }
        }
    }

    pub fn provenance(&self) -> Provenance {
        match self {
            AcquisitionResult::Success(..) => Provenance::Remote,
            AcquisitionResult::Fallback(..) => Provenance::Synthetic,
        }
    }

    pub fn fallback_reason(&self) -> Option<FallbackReason> {
        match self {
            AcquisitionResult::Success(..) => None,
            AcquisitionResult::Fallback(_, reason) => Some(*reason),
        }
    }

    /// Upstream model fields, present only for store readings.
    pub fn model(&self) -> Option<&ModelOutput> {
        match self {
            AcquisitionResult::Success(_, model) => Some(model),
            AcquisitionResult::Fallback(..) => None,
        }
    }
}

/// One pre-recorded sample used by replay mode.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReplaySample {
    pub turbidity: f64,
    pub tds: f64,
    pub ph: f64,
}

impl ReplaySample {
    pub const fn new(turbidity: f64, tds: f64, ph: f64) -> Self {
        Self { turbidity, tds, ph }
    }

    /// Copy with each value clamped into its metric's domain.
    pub fn clamped(&self) -> Self {
        Self {
            turbidity: Metric::Turbidity.definition().domain.clamp(self.turbidity),
            tds: Metric::Tds.definition().domain.clamp(self.tds),
            ph: Metric::Ph.definition().domain.clamp(self.ph),
        }
    }
}

/// A chemical dosing log entry. Display-only; passed through to exports.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DosingLog {
    pub id: String,
    pub timestamp: String,
    pub chemical: String,
    pub reason: String,
    pub amount: String,
    pub industry: String,
}
