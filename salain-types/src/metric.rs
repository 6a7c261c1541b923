//! Static metric domain: what each physical metric is and how it behaves.
//!
//! Every other component looks numbers up here instead of hardcoding them.

use core::fmt;

/// One of the six physical metrics reported by the sensor array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum Metric {
    Ph,
    Temperature,
    Tds,
    Turbidity,
    FlowRate,
    WaterLevel,
}

impl Metric {
    /// All metrics in display order.
    pub const ALL: [Metric; 6] = [
        Metric::Ph,
        Metric::Temperature,
        Metric::Tds,
        Metric::Turbidity,
        Metric::FlowRate,
        Metric::WaterLevel,
    ];

    /// Key used in export documents (camelCase).
    pub fn key(&self) -> &'static str {
        match self {
            Metric::Ph => "ph",
            Metric::Temperature => "temperature",
            Metric::Tds => "tds",
            Metric::Turbidity => "turbidity",
            Metric::FlowRate => "flowRate",
            Metric::WaterLevel => "waterLevel",
        }
    }

    /// Key used in the raw-telemetry payload (snake_case).
    pub fn telemetry_key(&self) -> &'static str {
        match self {
            Metric::FlowRate => "flow_rate",
            Metric::WaterLevel => "water_level",
            other => other.key(),
        }
    }

    /// Static definition for this metric.
    pub fn definition(&self) -> &'static MetricDefinition {
        &DEFINITIONS[*self as usize]
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A closed numeric interval `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Clamp a value into the range. NaN collapses to `min`.
    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            return self.min;
        }
        value.max(self.min).min(self.max)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}

/// Discrete per-metric status derived from a raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum StatusTag {
    Filtering,
    Dosing,
    Stagnant,
    Optimal,
    Warning,
    Critical,
}

/// How alarming a status is, for styling and aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Normal,
    Attention,
    Critical,
}

impl StatusTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusTag::Filtering => "filtering",
            StatusTag::Dosing => "dosing",
            StatusTag::Stagnant => "stagnant",
            StatusTag::Optimal => "optimal",
            StatusTag::Warning => "warning",
            StatusTag::Critical => "critical",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            StatusTag::Filtering | StatusTag::Optimal => Severity::Normal,
            StatusTag::Dosing | StatusTag::Stagnant | StatusTag::Warning => Severity::Attention,
            StatusTag::Critical => Severity::Critical,
        }
    }
}

impl fmt::Display for StatusTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison against a single status boundary. Both sides are strict.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    Below(f64),
    Above(f64),
}

impl Bound {
    pub fn matches(&self, value: f64) -> bool {
        match *self {
            Bound::Below(limit) => value < limit,
            Bound::Above(limit) => value > limit,
        }
    }
}

/// A status boundary: when `bound` matches, the metric takes `status`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusRule {
    pub bound: Bound,
    pub status: StatusTag,
}

const fn rule(bound: Bound, status: StatusTag) -> StatusRule {
    StatusRule { bound, status }
}

/// Static definition of a metric.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricDefinition {
    pub metric: Metric,
    /// Human-readable card title.
    pub label: &'static str,
    pub unit: &'static str,
    /// Physically valid values; generators never leave this range.
    pub domain: Range,
    /// Per-tick random-walk variance over `domain`.
    pub variance: f64,
    /// Starting value for generators.
    pub initial: f64,
    /// Tighter band used by replay-mode secondaries and synthetic forecasts.
    pub nominal: Range,
    pub nominal_variance: f64,
    /// Reference range shown next to the value.
    pub display_range: Range,
    /// Ordered status boundaries; the first match wins.
    pub rules: &'static [StatusRule],
    /// Status when no rule matches.
    pub default_status: StatusTag,
}

impl MetricDefinition {
    /// Derive the status tag for a raw value.
    pub fn status_of(&self, value: f64) -> StatusTag {
        self.rules
            .iter()
            .find(|r| r.bound.matches(value))
            .map_or(self.default_status, |r| r.status)
    }
}

/// Definitions indexed by `Metric as usize`.
pub static DEFINITIONS: [MetricDefinition; 6] = [
    MetricDefinition {
        metric: Metric::Ph,
        label: "pH Level",
        unit: "pH",
        domain: Range::new(0.0, 14.0),
        variance: 0.2,
        initial: 7.2,
        nominal: Range::new(6.8, 7.4),
        nominal_variance: 0.08,
        display_range: Range::new(6.5, 8.5),
        rules: &[
            rule(Bound::Below(5.0), StatusTag::Critical),
            rule(Bound::Above(9.0), StatusTag::Critical),
            rule(Bound::Below(6.0), StatusTag::Warning),
            rule(Bound::Above(8.5), StatusTag::Warning),
        ],
        default_status: StatusTag::Filtering,
    },
    MetricDefinition {
        metric: Metric::Temperature,
        label: "Temperature",
        unit: "°C",
        domain: Range::new(10.0, 40.0),
        variance: 0.5,
        initial: 24.5,
        nominal: Range::new(22.0, 28.0),
        nominal_variance: 0.3,
        display_range: Range::new(15.0, 35.0),
        rules: &[rule(Bound::Above(35.0), StatusTag::Warning)],
        default_status: StatusTag::Optimal,
    },
    MetricDefinition {
        metric: Metric::Tds,
        label: "TDS",
        unit: "ppm",
        domain: Range::new(100.0, 1000.0),
        variance: 20.0,
        initial: 450.0,
        nominal: Range::new(200.0, 250.0),
        nominal_variance: 8.0,
        display_range: Range::new(200.0, 800.0),
        rules: &[
            rule(Bound::Above(900.0), StatusTag::Critical),
            rule(Bound::Above(700.0), StatusTag::Warning),
        ],
        default_status: StatusTag::Filtering,
    },
    MetricDefinition {
        metric: Metric::Turbidity,
        label: "Turbidity",
        unit: "NTU",
        domain: Range::new(0.0, 100.0),
        variance: 2.0,
        initial: 12.5,
        nominal: Range::new(1.0, 3.0),
        nominal_variance: 0.2,
        display_range: Range::new(0.0, 25.0),
        rules: &[
            rule(Bound::Above(50.0), StatusTag::Critical),
            rule(Bound::Above(25.0), StatusTag::Dosing),
        ],
        default_status: StatusTag::Filtering,
    },
    MetricDefinition {
        metric: Metric::FlowRate,
        label: "Flow Rate",
        unit: "L/min",
        domain: Range::new(0.0, 150.0),
        variance: 5.0,
        initial: 85.3,
        nominal: Range::new(10.5, 14.2),
        nominal_variance: 0.4,
        display_range: Range::new(40.0, 120.0),
        rules: &[
            rule(Bound::Below(20.0), StatusTag::Stagnant),
            rule(Bound::Below(40.0), StatusTag::Warning),
        ],
        default_status: StatusTag::Optimal,
    },
    MetricDefinition {
        metric: Metric::WaterLevel,
        label: "Water Level",
        unit: "%",
        domain: Range::new(0.0, 100.0),
        variance: 2.0,
        initial: 65.0,
        nominal: Range::new(62.0, 68.5),
        nominal_variance: 0.8,
        display_range: Range::new(20.0, 80.0),
        rules: &[
            rule(Bound::Above(90.0), StatusTag::Critical),
            rule(Bound::Above(80.0), StatusTag::Warning),
        ],
        default_status: StatusTag::Optimal,
    },
];
