//! Remote telemetry store client.
//!
//! The store is an external collaborator exposing two read-only queries:
//! the most recent row, and the most recent `n` rows ordered newest first.
//! [`RestStore`] talks to a PostgREST-style HTTP API; tests and embedders can
//! provide their own [`Store`] implementation.

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use salain_types::{ClassificationLabel, Forecast, Metric, ModelOutput, SensorReading};
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when querying the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// HTTP request failed or returned a non-success status.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Failed to parse the response body.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Could not reach the store.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The transport gave up waiting for a response.
    #[error("Request timed out")]
    Timeout,

    /// The query succeeded but returned no rows.
    #[error("Store returned no rows")]
    Empty,
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            StoreError::Timeout
        } else if err.is_connect() {
            StoreError::Connection(err.to_string())
        } else if err.is_decode() {
            StoreError::Parse(err.to_string())
        } else {
            StoreError::Http(err.to_string())
        }
    }
}

/// One row as returned by the store. Every column is optional.
///
/// Columns are snake_case; camelCase spellings are accepted as aliases.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct StoreRow {
    #[serde(default)]
    pub ph: Option<f64>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub tds: Option<f64>,
    #[serde(default)]
    pub turbidity: Option<f64>,
    #[serde(default, alias = "flowRate")]
    pub flow_rate: Option<f64>,
    #[serde(default, alias = "waterLevel")]
    pub water_level: Option<f64>,

    #[serde(default)]
    pub classification: Option<String>,
    /// Upstream confidence percentage.
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default, alias = "lstmPredPh")]
    pub lstm_pred_ph: Option<f64>,
    #[serde(default, alias = "lstmPredTds")]
    pub lstm_pred_tds: Option<f64>,
    #[serde(default, alias = "lstmPredTurb")]
    pub lstm_pred_turb: Option<f64>,

    #[serde(default, alias = "createdAt")]
    pub created_at: Option<String>,
}

impl StoreRow {
    fn field(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Ph => self.ph,
            Metric::Temperature => self.temperature,
            Metric::Tds => self.tds,
            Metric::Turbidity => self.turbidity,
            Metric::FlowRate => self.flow_rate,
            Metric::WaterLevel => self.water_level,
        }
    }

    /// Metrics whose column was absent (or null) in this row.
    pub fn missing_fields(&self) -> Vec<Metric> {
        Metric::ALL.into_iter().filter(|m| self.field(*m).is_none()).collect()
    }

    /// Convert to a reading. Missing columns default to 0.
    ///
    /// This keeps the display continuous but makes "no data" look like a
    /// zero reading; check [`StoreRow::missing_fields`] to tell them apart.
    pub fn to_reading(&self) -> SensorReading {
        let mut reading = SensorReading::default();
        for metric in Metric::ALL {
            reading.set(metric, self.field(metric).unwrap_or(0.0));
        }
        reading
    }

    /// When the row was written, if the store sent a parseable RFC 3339 stamp.
    pub fn recorded_at(&self) -> Option<DateTime<Utc>> {
        let stamp = self.created_at.as_deref()?;
        DateTime::parse_from_rfc3339(stamp)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }

    /// Upstream classifier fields carried by this row.
    pub fn model_output(&self) -> ModelOutput {
        let forecast = match (self.lstm_pred_ph, self.lstm_pred_tds, self.lstm_pred_turb) {
            (None, None, None) => None,
            (ph, tds, turb) => Some(Forecast {
                predicted_ph: ph.unwrap_or(0.0),
                predicted_tds: tds.unwrap_or(0.0),
                predicted_turbidity: turb.unwrap_or(0.0),
            }),
        };
        ModelOutput {
            label: self.classification.as_deref().and_then(ClassificationLabel::parse),
            confidence: self.confidence,
            forecast,
        }
    }
}

/// Read-only access to the telemetry store.
#[async_trait]
pub trait Store: Send + Sync + Debug {
    /// The most recent row, `None` when the table is empty.
    async fn latest(&self) -> Result<Option<StoreRow>, StoreError>;

    /// Up to `n` most recent rows, newest first.
    async fn latest_n(&self, n: usize) -> Result<Vec<StoreRow>, StoreError>;

    /// Human-readable location of the store.
    fn description(&self) -> &str;
}

/// Store client for a PostgREST-style HTTP API.
#[derive(Debug, Clone)]
pub struct RestStore {
    client: Client,
    endpoint: String,
    table: String,
    order_column: String,
    api_key: Option<String>,
    description: String,
}

impl RestStore {
    /// Create a new builder for configuring the store client.
    pub fn builder() -> RestStoreBuilder {
        RestStoreBuilder::default()
    }

    fn query_url(&self, limit: usize) -> String {
        format!(
            "{}/rest/v1/{}?select=*&order={}.desc&limit={}",
            self.endpoint, self.table, self.order_column, limit
        )
    }

    async fn fetch(&self, limit: usize) -> Result<Vec<StoreRow>, StoreError> {
        let mut request = self.client.get(self.query_url(limit));
        if let Some(key) = &self.api_key {
            request = request.header("apikey", key).bearer_auth(key);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(StoreError::Http(format!(
                "API returned status {}",
                response.status()
            )));
        }

        response
            .json::<Vec<StoreRow>>()
            .await
            .map_err(|e| StoreError::Parse(e.to_string()))
    }
}

#[async_trait]
impl Store for RestStore {
    async fn latest(&self) -> Result<Option<StoreRow>, StoreError> {
        Ok(self.fetch(1).await?.into_iter().next())
    }

    async fn latest_n(&self, n: usize) -> Result<Vec<StoreRow>, StoreError> {
        self.fetch(n).await
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Builder for [`RestStore`].
#[derive(Debug)]
pub struct RestStoreBuilder {
    endpoint: String,
    table: String,
    order_column: String,
    api_key: Option<String>,
    request_timeout: Option<Duration>,
}

impl Default for RestStoreBuilder {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:54321".to_string(),
            table: "sensor_readings".to_string(),
            order_column: "created_at".to_string(),
            api_key: None,
            request_timeout: None,
        }
    }
}

impl RestStoreBuilder {
    /// Set the base URL of the API (without the `/rest/v1` suffix).
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the table holding sensor rows.
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Set the timestamp column used for newest-first ordering.
    pub fn order_column(mut self, column: impl Into<String>) -> Self {
        self.order_column = column.into();
        self
    }

    /// Set the API key sent as `apikey` and bearer token.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Transport-level timeout. The acquisition budget is enforced separately.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<RestStore, StoreError> {
        let mut client = Client::builder();
        if let Some(timeout) = self.request_timeout {
            client = client.timeout(timeout);
        }
        let client = client
            .build()
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        let description = format!("store: {}/{}", self.endpoint, self.table);
        Ok(RestStore {
            client,
            endpoint: self.endpoint,
            table: self.table,
            order_column: self.order_column,
            api_key: self.api_key,
            description,
        })
    }
}
