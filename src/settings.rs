//! Runtime settings.
//!
//! Layered lowest to highest: built-in defaults, an optional TOML file,
//! `SALAIN_*` environment variables (nested keys separated by `__`, e.g.
//! `SALAIN_STORE__URL`), then command-line overrides applied by the binary.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use salain_types::{DosingLog, ReplaySample};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::{Classifier, MAX_CAPACITY, MIN_CAPACITY};
use crate::snapshot::SnapshotBuilder;
use crate::source::{
    AcquisitionSource, RemoteReader, RestStore, StoreError, SyntheticGenerator, SyntheticSource,
};

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "SALAIN";

/// Invalid settings detected after loading.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("history_capacity must be between {min} and {max}, got {capacity}")]
    CapacityOutOfRange {
        capacity: usize,
        min: usize,
        max: usize,
    },

    #[error("interval_ms must be greater than zero")]
    ZeroInterval,

    #[error("timeout_ms must be greater than zero")]
    ZeroTimeout,

    #[error("product_prefix must not be empty")]
    EmptyPrefix,

    #[error("store url must start with http:// or https://, got {0:?}")]
    InvalidStoreUrl(String),
}

/// Connection details for the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Base URL of the PostgREST-style API.
    pub url: String,
    pub table: String,
    pub api_key: Option<String>,
    /// Timestamp column used to order rows newest first.
    pub order_column: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            table: "sensor_readings".to_string(),
            api_key: None,
            order_column: "created_at".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Overrides the device identifier in telemetry payloads.
    pub device_id: Option<String>,
    /// Export files are named `<product_prefix>-stats-<date>.json`.
    pub product_prefix: String,
    pub interval_ms: u64,
    /// Budget for each store query.
    pub timeout_ms: u64,
    pub history_capacity: usize,
    pub export_dir: PathBuf,
    /// Remote store; readings are synthetic when absent.
    pub store: Option<StoreSettings>,
    /// Replay deck for the synthetic generator; empty means random walk.
    pub replay: Vec<ReplaySample>,
    pub dosing_logs: Vec<DosingLog>,
    /// Fixed RNG seed for reproducible synthetic runs.
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            device_id: None,
            product_prefix: "salain".to_string(),
            interval_ms: 5000,
            timeout_ms: 3000,
            history_capacity: MIN_CAPACITY,
            export_dir: PathBuf::from("."),
            store: None,
            replay: Vec::new(),
            dosing_logs: Vec::new(),
            seed: None,
        }
    }
}

impl Settings {
    /// Load settings from an optional file plus the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings: Settings = builder
            .build()
            .context("failed to read configuration")?
            .try_deserialize()
            .context("invalid configuration")?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(MIN_CAPACITY..=MAX_CAPACITY).contains(&self.history_capacity) {
            return Err(SettingsError::CapacityOutOfRange {
                capacity: self.history_capacity,
                min: MIN_CAPACITY,
                max: MAX_CAPACITY,
            });
        }
        if self.interval_ms == 0 {
            return Err(SettingsError::ZeroInterval);
        }
        if self.timeout_ms == 0 {
            return Err(SettingsError::ZeroTimeout);
        }
        if self.product_prefix.trim().is_empty() {
            return Err(SettingsError::EmptyPrefix);
        }
        if let Some(store) = &self.store {
            if !(store.url.starts_with("http://") || store.url.starts_with("https://")) {
                return Err(SettingsError::InvalidStoreUrl(store.url.clone()));
            }
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Synthetic generator for this configuration.
    pub fn generator(&self) -> SyntheticGenerator {
        match self.seed {
            Some(seed) => SyntheticGenerator::seeded(self.replay.clone(), seed),
            None => SyntheticGenerator::replay(self.replay.clone()),
        }
    }

    pub fn classifier(&self) -> Classifier {
        match self.seed {
            Some(seed) => Classifier::seeded(seed.wrapping_add(1)),
            None => Classifier::new(),
        }
    }

    /// The acquisition source: a remote reader when a store is configured,
    /// the synthetic generator otherwise.
    pub fn build_source(&self) -> Result<Box<dyn AcquisitionSource>, StoreError> {
        let Some(store) = &self.store else {
            return Ok(Box::new(SyntheticSource::new(self.generator())));
        };

        let mut client = RestStore::builder()
            .endpoint(store.url.as_str())
            .table(store.table.as_str())
            .order_column(store.order_column.as_str())
            // The acquisition budget must win the race, not the transport
            .request_timeout(self.timeout() * 2);
        if let Some(key) = &store.api_key {
            client = client.api_key(key.as_str());
        }

        Ok(Box::new(RemoteReader::new(
            Arc::new(client.build()?),
            self.timeout(),
            self.generator(),
        )))
    }

    pub fn snapshot_builder(&self) -> SnapshotBuilder {
        SnapshotBuilder::new(self.product_prefix.as_str())
            .device_id(self.device_id.clone())
            .dosing_logs(self.dosing_logs.clone())
    }
}
