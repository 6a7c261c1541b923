//! System-level classification labels and model metadata.
//!
//! None of these values come from a trained model. Labels are rule-derived
//! and confidence/forecast figures are illustrative.

use core::fmt;

/// Overall classification of the water stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ClassificationLabel {
    #[cfg_attr(feature = "serde", serde(rename = "Optimal Flow"))]
    OptimalFlow,
    #[cfg_attr(feature = "serde", serde(rename = "Low-Level Contamination"))]
    LowLevelContamination,
    #[cfg_attr(feature = "serde", serde(rename = "High-Acidity Waste"))]
    HighAcidityWaste,
    #[cfg_attr(feature = "serde", serde(rename = "Critical Blockage"))]
    CriticalBlockage,
    #[cfg_attr(feature = "serde", serde(rename = "Safe - Non-Potable"))]
    SafeNonPotable,
}

impl ClassificationLabel {
    pub const ALL: [ClassificationLabel; 5] = [
        ClassificationLabel::SafeNonPotable,
        ClassificationLabel::OptimalFlow,
        ClassificationLabel::LowLevelContamination,
        ClassificationLabel::HighAcidityWaste,
        ClassificationLabel::CriticalBlockage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClassificationLabel::OptimalFlow => "Optimal Flow",
            ClassificationLabel::LowLevelContamination => "Low-Level Contamination",
            ClassificationLabel::HighAcidityWaste => "High-Acidity Waste",
            ClassificationLabel::CriticalBlockage => "Critical Blockage",
            ClassificationLabel::SafeNonPotable => "Safe - Non-Potable",
        }
    }

    /// Parse a label as written by upstream classifiers.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.as_str().eq_ignore_ascii_case(s.trim()))
    }

    /// Whether the label calls for operator attention.
    pub fn is_alarming(&self) -> bool {
        !matches!(
            self,
            ClassificationLabel::OptimalFlow | ClassificationLabel::SafeNonPotable
        )
    }
}

impl fmt::Display for ClassificationLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A label plus an illustrative confidence percentage in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Classification {
    pub classification: ClassificationLabel,
    pub confidence: u8,
}

impl Classification {
    pub fn new(classification: ClassificationLabel, confidence: u8) -> Self {
        Self {
            classification,
            confidence: confidence.min(100),
        }
    }

    /// Confidence as a `0.0..=1.0` fraction.
    pub fn confidence_fraction(&self) -> f64 {
        f64::from(self.confidence) / 100.0
    }
}

/// Short-horizon forecast values shown next to the classification.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Forecast {
    pub predicted_ph: f64,
    pub predicted_tds: f64,
    pub predicted_turbidity: f64,
}

/// Classifier fields carried by a store row, each optional.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModelOutput {
    pub label: Option<ClassificationLabel>,
    /// Upstream confidence percentage.
    pub confidence: Option<f64>,
    pub forecast: Option<Forecast>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_labels() {
        for label in ClassificationLabel::ALL {
            assert_eq!(ClassificationLabel::parse(label.as_str()), Some(label));
        }
        assert_eq!(
            ClassificationLabel::parse(" critical blockage "),
            Some(ClassificationLabel::CriticalBlockage)
        );
        assert_eq!(ClassificationLabel::parse("Unknown"), None);
    }

    #[test]
    fn test_confidence_capped() {
        let c = Classification::new(ClassificationLabel::OptimalFlow, 140);
        assert_eq!(c.confidence, 100);
        assert_eq!(c.confidence_fraction(), 1.0);
    }

    #[test]
    fn test_alarming() {
        assert!(!ClassificationLabel::OptimalFlow.is_alarming());
        assert!(!ClassificationLabel::SafeNonPotable.is_alarming());
        assert!(ClassificationLabel::CriticalBlockage.is_alarming());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_label_serde() {
        let json = serde_json::to_string(&ClassificationLabel::HighAcidityWaste).unwrap();
        assert_eq!(json, "\"High-Acidity Waste\"");
        let back: ClassificationLabel = serde_json::from_str("\"Safe - Non-Potable\"").unwrap();
        assert_eq!(back, ClassificationLabel::SafeNonPotable);
    }
}
