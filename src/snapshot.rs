//! Telemetry payloads and export documents built from the acquisition state.
//!
//! Two shapes are produced from the same state:
//!
//! - [`TelemetrySnapshot`]: the raw-telemetry view (snake_case keys), also
//!   emitted line by line in headless mode.
//! - [`ExportDocument`]: the downloadable stats file (camelCase keys).

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use salain_types::{
    Classification, ClassificationLabel, DosingLog, Metric, Provenance, SensorReading, StatusTag,
};
use serde::{Deserialize, Serialize};

use crate::data::{status_of, SystemStatus};
use crate::scheduler::AcquisitionState;

/// Device identifier used for store readings when none is configured.
pub const DEFAULT_REMOTE_DEVICE: &str = "RPi-001";
/// Device identifier used for synthetic readings when none is configured.
pub const DEFAULT_SYNTHETIC_DEVICE: &str = "Mock-Generator";

/// Forecast horizon shown next to predicted values, in minutes.
pub const FORECAST_HORIZON_MIN: u32 = 10;

/// RFC 3339 UTC with millisecond precision.
pub fn timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Link state shown in the telemetry payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Link {
    /// Readings come from the store.
    Active,
    /// No store is configured.
    Simulated,
    /// A configured store failed or timed out.
    Degraded,
    /// Acquisition has stopped.
    Offline,
}

impl Link {
    pub fn as_str(&self) -> &'static str {
        match self {
            Link::Active => "ACTIVE",
            Link::Simulated => "SIMULATED",
            Link::Degraded => "DEGRADED",
            Link::Offline => "OFFLINE",
        }
    }

    fn of(state: &AcquisitionState) -> Self {
        match state.system_status() {
            SystemStatus::Offline => Link::Offline,
            SystemStatus::Degraded => Link::Degraded,
            SystemStatus::Online => match state.current().provenance {
                Provenance::Remote => Link::Active,
                Provenance::Synthetic => Link::Simulated,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorEntry {
    pub value: f64,
    pub unit: String,
    pub status: StatusTag,
}

impl SensorEntry {
    fn new(metric: Metric, reading: &SensorReading) -> Self {
        let value = reading.get(metric);
        Self {
            value,
            unit: metric.definition().unit.to_string(),
            status: status_of(metric, value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sensors {
    pub ph: SensorEntry,
    pub temperature: SensorEntry,
    pub tds: SensorEntry,
    pub turbidity: SensorEntry,
    pub flow_rate: SensorEntry,
    pub water_level: SensorEntry,
}

impl Sensors {
    fn new(reading: &SensorReading) -> Self {
        Self {
            ph: SensorEntry::new(Metric::Ph, reading),
            temperature: SensorEntry::new(Metric::Temperature, reading),
            tds: SensorEntry::new(Metric::Tds, reading),
            turbidity: SensorEntry::new(Metric::Turbidity, reading),
            flow_rate: SensorEntry::new(Metric::FlowRate, reading),
            water_level: SensorEntry::new(Metric::WaterLevel, reading),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GbmClassifier {
    pub classification: ClassificationLabel,
    /// Fraction in `0.0..=1.0`.
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LstmPredictor {
    pub forecast_horizon_min: u32,
    pub predicted_ph: f64,
    pub predicted_tds: f64,
    pub predicted_turb: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MlModels {
    pub gbm_classifier: GbmClassifier,
    pub lstm_predictor: LstmPredictor,
}

/// Static actuator states. Display only; nothing here drives hardware.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpioStatus {
    pub pump_hcl: String,
    pub pump_naoh: String,
    pub main_valve: String,
}

impl Default for GpioStatus {
    fn default() -> Self {
        Self {
            pump_hcl: "STANDBY".to_string(),
            pump_naoh: "STANDBY".to_string(),
            main_valve: "OPEN".to_string(),
        }
    }
}

/// Raw-telemetry payload, rendered verbatim by the inspection view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub timestamp: String,
    pub device_id: String,
    pub source: Provenance,
    pub link: Link,
    pub sensors: Sensors,
    pub ml_models: MlModels,
    pub gpio_status: GpioStatus,
}

/// The exported stats file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub export_date: String,
    pub sensor_data: SensorReading,
    pub historical_data: BTreeMap<Metric, Vec<f64>>,
    pub ai_analysis: Classification,
    pub dosing_logs: Vec<DosingLog>,
    pub system_status: SystemStatus,
}

/// Assembles snapshots and exports from [`AcquisitionState`].
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    product_prefix: String,
    device_id: Option<String>,
    dosing_logs: Vec<DosingLog>,
}

impl SnapshotBuilder {
    pub fn new(product_prefix: impl Into<String>) -> Self {
        Self {
            product_prefix: product_prefix.into(),
            device_id: None,
            dosing_logs: Vec::new(),
        }
    }

    /// Override the device identifier for every payload.
    pub fn device_id(mut self, device_id: Option<String>) -> Self {
        self.device_id = device_id;
        self
    }

    /// Dosing logs passed through to the export document.
    pub fn dosing_logs(mut self, logs: Vec<DosingLog>) -> Self {
        self.dosing_logs = logs;
        self
    }

    pub fn logs(&self) -> &[DosingLog] {
        &self.dosing_logs
    }

    fn device_for(&self, provenance: Provenance) -> String {
        match (&self.device_id, provenance) {
            (Some(id), _) => id.clone(),
            (None, Provenance::Remote) => DEFAULT_REMOTE_DEVICE.to_string(),
            (None, Provenance::Synthetic) => DEFAULT_SYNTHETIC_DEVICE.to_string(),
        }
    }

    pub fn telemetry(&self, state: &AcquisitionState, now: DateTime<Utc>) -> TelemetrySnapshot {
        let current = state.current();
        let assessment = &current.assessment;
        TelemetrySnapshot {
            timestamp: timestamp(now),
            device_id: self.device_for(current.provenance),
            source: current.provenance,
            link: Link::of(state),
            sensors: Sensors::new(&current.reading),
            ml_models: MlModels {
                gbm_classifier: GbmClassifier {
                    classification: assessment.classification.classification,
                    confidence: assessment.classification.confidence_fraction(),
                },
                lstm_predictor: LstmPredictor {
                    forecast_horizon_min: FORECAST_HORIZON_MIN,
                    predicted_ph: assessment.forecast.predicted_ph,
                    predicted_tds: assessment.forecast.predicted_tds,
                    predicted_turb: assessment.forecast.predicted_turbidity,
                },
            },
            gpio_status: GpioStatus::default(),
        }
    }

    pub fn export(&self, state: &AcquisitionState, now: DateTime<Utc>) -> ExportDocument {
        ExportDocument {
            export_date: timestamp(now),
            sensor_data: state.current().reading,
            historical_data: state.history().to_export(),
            ai_analysis: state.current().assessment.classification,
            dosing_logs: self.dosing_logs.clone(),
            system_status: state.system_status(),
        }
    }

    /// `<prefix>-stats-<YYYY-MM-DD>.json`
    pub fn export_filename(&self, date: NaiveDate) -> String {
        format!("{}-stats-{}.json", self.product_prefix, date.format("%Y-%m-%d"))
    }

    /// Write the export document into `dir` and return the file path.
    pub fn write_export(
        &self,
        state: &AcquisitionState,
        dir: &Path,
        now: DateTime<Utc>,
    ) -> Result<PathBuf> {
        let document = self.export(state, now);
        let path = dir.join(self.export_filename(now.date_naive()));
        let json = serde_json::to_string_pretty(&document)?;
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Classifier;
    use crate::scheduler::Scheduler;
    use crate::source::testing::ScriptedSource;
    use crate::source::{SyntheticGenerator, SyntheticSource};
    use chrono::TimeZone;
    use std::time::Duration;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 8, 30, 0).unwrap()
    }

    async fn remote_state() -> AcquisitionState {
        let source = ScriptedSource::new(Vec::new(), 300.0);
        let scheduler = Scheduler::bootstrap(
            Box::new(source),
            20,
            Duration::from_secs(5),
            Classifier::seeded(1),
        )
        .await;
        scheduler.tick().await;
        scheduler.state()
    }

    fn logs() -> Vec<DosingLog> {
        vec![DosingLog {
            id: "1".to_string(),
            timestamp: "10:42:15".to_string(),
            chemical: "HCl".to_string(),
            reason: "pH 9.2 → Target 7.0".to_string(),
            amount: "25mL".to_string(),
            industry: "Metal Industry".to_string(),
        }]
    }

    #[tokio::test]
    async fn test_telemetry_payload_shape() {
        let state = remote_state().await;
        let snapshot = SnapshotBuilder::new("salain").telemetry(&state, now());
        let json = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(json["timestamp"], "2026-10-19T08:30:00.000Z");
        assert_eq!(json["device_id"], "RPi-001");
        assert_eq!(json["source"], "remote");
        assert_eq!(json["link"], "ACTIVE");
        assert_eq!(json["sensors"]["tds"]["value"], 301.0);
        assert_eq!(json["sensors"]["tds"]["unit"], "ppm");
        assert_eq!(json["sensors"]["tds"]["status"], "filtering");
        assert_eq!(json["sensors"]["flow_rate"]["status"], "optimal");
        assert_eq!(json["sensors"]["water_level"]["value"], 65.0);
        assert_eq!(
            json["ml_models"]["gbm_classifier"]["classification"],
            "Optimal Flow"
        );
        let confidence = json["ml_models"]["gbm_classifier"]["confidence"].as_f64().unwrap();
        assert!((0.85..=0.96).contains(&confidence));
        assert_eq!(json["ml_models"]["lstm_predictor"]["forecast_horizon_min"], 10);
        assert_eq!(json["gpio_status"]["pump_hcl"], "STANDBY");
        assert_eq!(json["gpio_status"]["main_valve"], "OPEN");
    }

    #[tokio::test]
    async fn test_synthetic_device_and_link() {
        let source = SyntheticSource::new(SyntheticGenerator::seeded(Vec::new(), 2));
        let scheduler = Scheduler::bootstrap(
            Box::new(source),
            20,
            Duration::from_secs(5),
            Classifier::seeded(1),
        )
        .await;

        let builder = SnapshotBuilder::new("salain");
        let snapshot = builder.telemetry(&scheduler.state(), now());
        assert_eq!(snapshot.device_id, "Mock-Generator");
        assert_eq!(snapshot.link, Link::Simulated);

        scheduler.shutdown();
        let snapshot = builder
            .device_id(Some("plant-7".to_string()))
            .telemetry(&scheduler.state(), now());
        assert_eq!(snapshot.device_id, "plant-7");
        assert_eq!(snapshot.link, Link::Offline);
    }

    #[test]
    fn test_export_filename() {
        let builder = SnapshotBuilder::new("salain");
        let date = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        assert_eq!(builder.export_filename(date), "salain-stats-2026-03-07.json");
    }

    #[tokio::test]
    async fn test_export_round_trip() {
        let state = remote_state().await;
        let dir = tempfile::tempdir().unwrap();
        let builder = SnapshotBuilder::new("salain").dosing_logs(logs());

        let path = builder.write_export(&state, dir.path(), now()).unwrap();
        assert_eq!(path, dir.path().join("salain-stats-2026-10-19.json"));

        let text = std::fs::read_to_string(&path).unwrap();
        let raw: serde_json::Value = serde_json::from_str(&text).unwrap();
        for key in [
            "exportDate",
            "sensorData",
            "historicalData",
            "aiAnalysis",
            "dosingLogs",
            "systemStatus",
        ] {
            assert!(raw.get(key).is_some(), "missing {key}");
        }
        assert_eq!(raw["sensorData"]["flowRate"], 85.3);
        assert_eq!(raw["historicalData"]["waterLevel"].as_array().unwrap().len(), 20);
        assert_eq!(raw["systemStatus"], "online");

        let document: ExportDocument = serde_json::from_str(&text).unwrap();
        assert_eq!(document.sensor_data, state.current().reading);
        assert_eq!(document.historical_data, state.history().to_export());
        assert_eq!(document.dosing_logs, logs());
        assert_eq!(document.ai_analysis, state.current().assessment.classification);
    }

    #[tokio::test]
    async fn test_export_round_trip_random_walk() {
        let dir = tempfile::tempdir().unwrap();
        let builder = SnapshotBuilder::new("salain");

        for seed in 1..=8 {
            let source = SyntheticSource::new(SyntheticGenerator::seeded(Vec::new(), seed));
            let scheduler = Scheduler::bootstrap(
                Box::new(source),
                30,
                Duration::from_secs(5),
                Classifier::seeded(seed),
            )
            .await;
            for _ in 0..5 {
                scheduler.tick().await;
            }
            let state = scheduler.state();

            let path = builder.write_export(&state, dir.path(), now()).unwrap();
            let text = std::fs::read_to_string(&path).unwrap();
            let document: ExportDocument = serde_json::from_str(&text).unwrap();

            assert_eq!(document.sensor_data, state.current().reading, "seed {seed}");
            assert_eq!(
                document.historical_data,
                state.history().to_export(),
                "seed {seed}"
            );
            assert_eq!(document.ai_analysis, state.current().assessment.classification);
        }
    }
}
