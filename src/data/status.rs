//! Status tags, overall classification and system status.
//!
//! Tags and labels are pure functions of the reading. The only randomness is
//! the illustrative confidence and forecast drawn by [`Classifier`] when the
//! store did not supply them.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use salain_types::{
    AcquisitionResult, Classification, ClassificationLabel, FallbackReason, Forecast, Metric,
    ModelOutput, SensorReading, StatusTag,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Water level above which the overflow alert is raised.
pub const OVERFLOW_WARNING_LEVEL: f64 = 75.0;

/// Minutes to overflow projected at exactly [`OVERFLOW_WARNING_LEVEL`].
const OVERFLOW_HORIZON_MIN: f64 = 10.0;

/// Illustrative confidence band, inclusive.
const CONFIDENCE_MIN: u8 = 85;
const CONFIDENCE_MAX: u8 = 96;

/// Status tag for one metric value.
pub fn status_of(metric: Metric, value: f64) -> StatusTag {
    metric.definition().status_of(value)
}

/// Overall label for a reading. First matching rule wins.
pub fn classify(reading: &SensorReading) -> ClassificationLabel {
    if reading.water_level > 85.0 {
        ClassificationLabel::CriticalBlockage
    } else if reading.ph < 5.0 || reading.ph > 9.0 {
        ClassificationLabel::HighAcidityWaste
    } else if reading.tds > 800.0 {
        ClassificationLabel::LowLevelContamination
    } else {
        ClassificationLabel::OptimalFlow
    }
}

/// The upstream label, when the store sent one that differs from `derived`.
pub fn upstream_disagreement(
    model: Option<&ModelOutput>,
    derived: ClassificationLabel,
) -> Option<ClassificationLabel> {
    model.and_then(|m| m.label).filter(|upstream| *upstream != derived)
}

/// Projected time to overflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverflowAlert {
    pub minutes: u32,
    pub message: String,
}

/// Linear overflow projection, raised only above [`OVERFLOW_WARNING_LEVEL`].
pub fn overflow_alert(water_level: f64) -> Option<OverflowAlert> {
    if water_level.is_nan() || water_level <= OVERFLOW_WARNING_LEVEL {
        return None;
    }
    let remaining = (OVERFLOW_HORIZON_MIN - (water_level - OVERFLOW_WARNING_LEVEL) / 2.0).max(0.0);
    let minutes = remaining.floor() as u32;
    Some(OverflowAlert {
        minutes,
        message: format!(
            "Notification: AI predicts potential overflow in T-minus {minutes} minutes."
        ),
    })
}

/// Classification plus forecast for one acquisition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Assessment {
    pub classification: Classification,
    pub forecast: Forecast,
}

/// Derives the [`Assessment`] for each acquisition result.
///
/// Confidence and forecast are display figures, not model output. Upstream
/// values are passed through when the store supplied them; otherwise they are
/// drawn once per acquisition.
#[derive(Debug)]
pub struct Classifier {
    rng: StdRng,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn assess(&mut self, result: &AcquisitionResult) -> Assessment {
        let reading = result.reading();
        let label = classify(reading);
        let model = result.model();
        if let Some(upstream) = upstream_disagreement(model, label) {
            debug!(%upstream, derived = %label, "upstream label overridden by reading rules");
        }

        let confidence = match model.and_then(|m| m.confidence) {
            Some(percent) if percent.is_finite() => percent.round().clamp(0.0, 100.0) as u8,
            _ => self.rng.random_range(CONFIDENCE_MIN..=CONFIDENCE_MAX),
        };

        let forecast = match model.and_then(|m| m.forecast) {
            Some(forecast) => forecast,
            None => self.synthetic_forecast(),
        };

        Assessment {
            classification: Classification::new(label, confidence),
            forecast,
        }
    }

    fn synthetic_forecast(&mut self) -> Forecast {
        let mut draw = |metric: Metric| {
            let band = metric.definition().nominal;
            self.rng.random_range(band.min..=band.max)
        };
        Forecast {
            predicted_ph: draw(Metric::Ph),
            predicted_tds: draw(Metric::Tds),
            predicted_turbidity: draw(Metric::Turbidity),
        }
    }
}

/// Health of the acquisition pipeline as shown in the header and export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemStatus {
    Online,
    Degraded,
    Offline,
}

impl SystemStatus {
    /// Status implied by the last cycle, or `Offline` once stopped.
    pub fn derive(last: Option<FallbackReason>, running: bool) -> Self {
        if !running {
            return SystemStatus::Offline;
        }
        match last {
            Some(reason) if reason.is_degraded() => SystemStatus::Degraded,
            _ => SystemStatus::Online,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SystemStatus::Online => "online",
            SystemStatus::Degraded => "degraded",
            SystemStatus::Offline => "offline",
        }
    }
}

impl std::fmt::Display for SystemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use salain_types::ModelOutput;

    fn reading(ph: f64, tds: f64, water_level: f64) -> SensorReading {
        SensorReading::initial()
            .with(Metric::Ph, ph)
            .with(Metric::Tds, tds)
            .with(Metric::WaterLevel, water_level)
    }

    #[test]
    fn test_status_thresholds() {
        assert_eq!(status_of(Metric::Ph, 4.9), StatusTag::Critical);
        assert_eq!(status_of(Metric::Ph, 9.2), StatusTag::Critical);
        assert_eq!(status_of(Metric::Ph, 5.5), StatusTag::Warning);
        assert_eq!(status_of(Metric::Ph, 8.6), StatusTag::Warning);
        assert_eq!(status_of(Metric::Ph, 7.0), StatusTag::Filtering);
        assert_eq!(status_of(Metric::Temperature, 36.0), StatusTag::Warning);
        assert_eq!(status_of(Metric::Temperature, 35.0), StatusTag::Optimal);
        assert_eq!(status_of(Metric::Tds, 901.0), StatusTag::Critical);
        assert_eq!(status_of(Metric::Tds, 850.0), StatusTag::Warning);
        assert_eq!(status_of(Metric::Turbidity, 30.0), StatusTag::Dosing);
        assert_eq!(status_of(Metric::Turbidity, 51.0), StatusTag::Critical);
        assert_eq!(status_of(Metric::FlowRate, 10.0), StatusTag::Stagnant);
        assert_eq!(status_of(Metric::FlowRate, 30.0), StatusTag::Warning);
        assert_eq!(status_of(Metric::FlowRate, 60.0), StatusTag::Optimal);
        assert_eq!(status_of(Metric::WaterLevel, 95.0), StatusTag::Critical);
        assert_eq!(status_of(Metric::WaterLevel, 85.0), StatusTag::Warning);
        assert_eq!(status_of(Metric::WaterLevel, 80.0), StatusTag::Optimal);
    }

    #[test]
    fn test_classify_priority() {
        assert_eq!(
            classify(&reading(7.0, 100.0, 90.0)),
            ClassificationLabel::CriticalBlockage
        );
        assert_eq!(
            classify(&reading(4.0, 900.0, 50.0)),
            ClassificationLabel::HighAcidityWaste
        );
        assert_eq!(
            classify(&reading(7.0, 850.0, 50.0)),
            ClassificationLabel::LowLevelContamination
        );
        assert_eq!(classify(&reading(7.0, 400.0, 50.0)), ClassificationLabel::OptimalFlow);
    }

    #[test]
    fn test_acidic_spike_scenario() {
        let r = SensorReading::new(9.2, 24.0, 850.0, 10.0, 60.0, 40.0);
        assert_eq!(status_of(Metric::Ph, r.ph), StatusTag::Critical);
        assert_eq!(status_of(Metric::Tds, r.tds), StatusTag::Warning);
        assert_eq!(classify(&r), ClassificationLabel::HighAcidityWaste);
    }

    #[test]
    fn test_blockage_scenario() {
        let r = SensorReading::new(7.0, 24.0, 400.0, 5.0, 60.0, 88.0);
        assert_eq!(classify(&r), ClassificationLabel::CriticalBlockage);
    }

    #[test]
    fn test_overflow_alert() {
        assert!(overflow_alert(75.0).is_none());
        assert!(overflow_alert(40.0).is_none());

        let alert = overflow_alert(80.0).unwrap();
        assert_eq!(alert.minutes, 7);
        assert_eq!(
            alert.message,
            "Notification: AI predicts potential overflow in T-minus 7 minutes."
        );

        assert_eq!(overflow_alert(75.5).unwrap().minutes, 9);
        assert_eq!(overflow_alert(100.0).unwrap().minutes, 0);
    }

    #[test]
    fn test_synthetic_confidence_band() {
        let mut classifier = Classifier::seeded(4);
        let result = AcquisitionResult::Fallback(
            SensorReading::initial(),
            FallbackReason::NotConfigured,
        );
        for _ in 0..500 {
            let assessment = classifier.assess(&result);
            let confidence = assessment.classification.confidence;
            assert!((85..=96).contains(&confidence), "{confidence}");
            assert!(Metric::Ph
                .definition()
                .nominal
                .contains(assessment.forecast.predicted_ph));
        }
    }

    #[test]
    fn test_upstream_values_pass_through() {
        let forecast = Forecast {
            predicted_ph: 7.05,
            predicted_tds: 230.0,
            predicted_turbidity: 2.1,
        };
        let model = ModelOutput {
            label: Some(ClassificationLabel::SafeNonPotable),
            confidence: Some(130.0),
            forecast: Some(forecast),
        };
        let result = AcquisitionResult::Success(reading(4.0, 300.0, 50.0), model);

        let assessment = Classifier::seeded(1).assess(&result);
        // The label is always derived from the reading
        assert_eq!(
            assessment.classification.classification,
            ClassificationLabel::HighAcidityWaste
        );
        assert_eq!(assessment.classification.confidence, 100);
        assert_eq!(assessment.forecast, forecast);
        assert_eq!(
            upstream_disagreement(result.model(), ClassificationLabel::HighAcidityWaste),
            Some(ClassificationLabel::SafeNonPotable)
        );
    }

    #[test]
    fn test_upstream_disagreement() {
        let agreeing = ModelOutput {
            label: Some(ClassificationLabel::OptimalFlow),
            ..Default::default()
        };
        assert_eq!(
            upstream_disagreement(Some(&agreeing), ClassificationLabel::OptimalFlow),
            None
        );
        assert_eq!(
            upstream_disagreement(Some(&agreeing), ClassificationLabel::CriticalBlockage),
            Some(ClassificationLabel::OptimalFlow)
        );
        assert_eq!(
            upstream_disagreement(Some(&ModelOutput::default()), ClassificationLabel::OptimalFlow),
            None
        );
        assert_eq!(upstream_disagreement(None, ClassificationLabel::OptimalFlow), None);
    }

    #[test]
    fn test_system_status() {
        assert_eq!(SystemStatus::derive(None, true), SystemStatus::Online);
        assert_eq!(
            SystemStatus::derive(Some(FallbackReason::NotConfigured), true),
            SystemStatus::Online
        );
        assert_eq!(
            SystemStatus::derive(Some(FallbackReason::Timeout), true),
            SystemStatus::Degraded
        );
        assert_eq!(
            SystemStatus::derive(Some(FallbackReason::StoreError), true),
            SystemStatus::Degraded
        );
        assert_eq!(SystemStatus::derive(None, false), SystemStatus::Offline);
    }
}
