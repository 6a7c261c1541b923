//! Synthetic reading generator.
//!
//! Stands in for the remote store when none is configured and whenever a
//! store call fails or times out. Two strategies, picked once at startup:
//!
//! - **Random walk**: every metric drifts by `uniform(-variance/2, variance/2)`
//!   per tick and is clamped into its domain.
//! - **Replay**: turbidity, TDS and pH cycle through a fixed deck of recorded
//!   samples, one per tick with wraparound; temperature, flow rate and water
//!   level random-walk inside their nominal bands.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use salain_types::{
    AcquisitionResult, FallbackReason, Metric, Provenance, Range, ReplaySample, SensorReading,
};
use tracing::debug;

use super::{AcquisitionSource, Seed};

/// Built-in replay deck used by `--replay-demo`.
///
/// Walks from clean water through dosing and contamination to an acidic spike
/// and an alkaline excursion.
pub const DEMO_REPLAY: [ReplaySample; 5] = [
    ReplaySample::new(2.1, 225.0, 7.1),
    ReplaySample::new(18.4, 480.0, 6.6),
    ReplaySample::new(32.0, 760.0, 5.8),
    ReplaySample::new(55.0, 920.0, 4.6),
    ReplaySample::new(8.5, 310.0, 8.7),
];

/// Metrics that replay mode random-walks instead of replaying.
const REPLAY_SECONDARIES: [Metric; 3] = [Metric::Temperature, Metric::FlowRate, Metric::WaterLevel];

/// One bounded random-walk step: `clamp(previous + uniform(-variance/2, variance/2))`.
pub fn random_walk_step<R: Rng>(
    rng: &mut R,
    previous: f64,
    variance: f64,
    bounds: Range,
) -> f64 {
    let half = variance.abs() / 2.0;
    let delta = if half > 0.0 {
        rng.random_range(-half..=half)
    } else {
        0.0
    };
    bounds.clamp(previous + delta)
}

#[derive(Debug, Clone)]
enum Mode {
    RandomWalk,
    Replay {
        samples: Vec<ReplaySample>,
        cursor: usize,
    },
}

/// Produces plausible readings that never leave the metric domains.
#[derive(Debug)]
pub struct SyntheticGenerator {
    mode: Mode,
    previous: SensorReading,
    rng: StdRng,
}

impl SyntheticGenerator {
    /// Random-walk generator seeded from the OS.
    pub fn random_walk() -> Self {
        Self::new(Mode::RandomWalk, StdRng::from_os_rng())
    }

    /// Replay generator over `samples`.
    ///
    /// An empty deck falls back to random-walk mode.
    pub fn replay(samples: Vec<ReplaySample>) -> Self {
        Self::from_samples(samples, StdRng::from_os_rng())
    }

    /// Generator driven by a fixed seed, for reproducible runs and tests.
    pub fn seeded(samples: Vec<ReplaySample>, seed: u64) -> Self {
        Self::from_samples(samples, StdRng::seed_from_u64(seed))
    }

    fn from_samples(samples: Vec<ReplaySample>, rng: StdRng) -> Self {
        if samples.is_empty() {
            return Self::new(Mode::RandomWalk, rng);
        }
        let samples = samples.iter().map(ReplaySample::clamped).collect();
        Self::new(Mode::Replay { samples, cursor: 0 }, rng)
    }

    fn new(mode: Mode, rng: StdRng) -> Self {
        let mut previous = SensorReading::initial();
        if let Mode::Replay { .. } = mode {
            for metric in REPLAY_SECONDARIES {
                let def = metric.definition();
                previous.set(metric, def.nominal.clamp(def.initial));
            }
        }
        Self {
            mode,
            previous,
            rng,
        }
    }

    pub fn is_replay(&self) -> bool {
        matches!(self.mode, Mode::Replay { .. })
    }

    /// Index of the next replay sample, `None` in random-walk mode.
    pub fn cursor(&self) -> Option<usize> {
        match &self.mode {
            Mode::Replay { cursor, .. } => Some(*cursor),
            Mode::RandomWalk => None,
        }
    }

    /// Number of samples in the replay deck (0 in random-walk mode).
    pub fn deck_len(&self) -> usize {
        match &self.mode {
            Mode::Replay { samples, .. } => samples.len(),
            Mode::RandomWalk => 0,
        }
    }

    /// The last reading produced or observed.
    pub fn previous(&self) -> &SensorReading {
        &self.previous
    }

    /// Re-anchor the walk on an externally obtained reading.
    pub fn observe(&mut self, reading: &SensorReading) {
        self.previous = reading.clamped();
    }

    /// Produce the next reading. Never fails, never leaves the domain.
    pub fn next_reading(&mut self) -> SensorReading {
        let next = match &mut self.mode {
            Mode::RandomWalk => {
                let mut next = self.previous;
                for metric in Metric::ALL {
                    let def = metric.definition();
                    let value = random_walk_step(
                        &mut self.rng,
                        self.previous.get(metric),
                        def.variance,
                        def.domain,
                    );
                    next.set(metric, value);
                }
                next
            }
            Mode::Replay { samples, cursor } => {
                let sample = samples[*cursor];
                *cursor = (*cursor + 1) % samples.len();

                let mut next = self
                    .previous
                    .with(Metric::Turbidity, sample.turbidity)
                    .with(Metric::Tds, sample.tds)
                    .with(Metric::Ph, sample.ph);
                for metric in REPLAY_SECONDARIES {
                    let def = metric.definition();
                    let value = random_walk_step(
                        &mut self.rng,
                        self.previous.get(metric),
                        def.nominal_variance,
                        def.nominal,
                    );
                    next.set(metric, value);
                }
                next
            }
        };
        self.previous = next;
        next
    }

    /// `count` sequential readings, oldest first.
    pub fn bootstrap(&mut self, count: usize) -> Vec<SensorReading> {
        (0..count).map(|_| self.next_reading()).collect()
    }

    /// Uniform draw inside `range`, used for illustrative model figures.
    pub fn draw(&mut self, range: Range) -> f64 {
        if range.span() > 0.0 {
            self.rng.random_range(range.min..=range.max)
        } else {
            range.min
        }
    }
}

/// Acquisition source backed only by the synthetic generator.
#[derive(Debug)]
pub struct SyntheticSource {
    generator: SyntheticGenerator,
    description: String,
}

impl SyntheticSource {
    pub fn new(generator: SyntheticGenerator) -> Self {
        let description = if generator.is_replay() {
            format!("synthetic: replay ({} samples)", generator.deck_len())
        } else {
            "synthetic: random walk".to_string()
        };
        Self {
            generator,
            description,
        }
    }

    pub fn generator(&self) -> &SyntheticGenerator {
        &self.generator
    }
}

#[async_trait]
impl AcquisitionSource for SyntheticSource {
    async fn read(&mut self) -> AcquisitionResult {
        let reading = self.generator.next_reading();
        debug!(cursor = ?self.generator.cursor(), "synthetic reading generated");
        AcquisitionResult::Fallback(reading, FallbackReason::NotConfigured)
    }

    async fn history_seed(&mut self, capacity: usize) -> Seed {
        Seed {
            readings: self.generator.bootstrap(capacity),
            provenance: Provenance::Synthetic,
        }
    }

    fn description(&self) -> &str {
        &self.description
    }
}
