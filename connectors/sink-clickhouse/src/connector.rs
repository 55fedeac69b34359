//! ClickHouse sink implementation

use crate::coerce::coerce_row;
use crate::config::{ClickHouseSinkConfig, CONFIG_SCHEMA};
use crate::SINK_TYPE;
use async_trait::async_trait;
use relay_connect_core::{Configurable, ConnectorError, ConnectorResult, Sink};
use serde_json::Value;
use tracing::{debug, error, info};
use url::Url;

/// Sink inserting one row per event into a ClickHouse table
pub struct ClickHouseSink {
    config: ClickHouseSinkConfig,
    client: Option<reqwest::Client>,
    insert_url: Option<Url>,
}

impl ClickHouseSink {
    /// Create a ClickHouse sink with configuration
    pub fn with_config(config: ClickHouseSinkConfig) -> Self {
        Self {
            config,
            client: None,
            insert_url: None,
        }
    }

    pub fn config(&self) -> &ClickHouseSinkConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    /// Parse, strip and coerce one record into a `JSONEachRow` line
    fn prepare_row(message: &str) -> ConnectorResult<String> {
        let parsed: Value = serde_json::from_str(message).map_err(|e| {
            ConnectorError::invalid_data(format!("Invalid JSON: {}", e), message)
        })?;
        let Value::Object(mut row) = parsed else {
            return Err(ConnectorError::invalid_data(
                "Expected a JSON object per record",
                message,
            ));
        };

        row.remove("type");
        coerce_row(&mut row)?;

        serde_json::to_string(&row).map_err(|e| ConnectorError::Serialization(e.to_string()))
    }
}

impl Configurable for ClickHouseSink {
    fn config_schema() -> &'static Value {
        &CONFIG_SCHEMA
    }

    fn from_config(config: Value) -> ConnectorResult<Self> {
        Ok(Self::with_config(ClickHouseSinkConfig::from_value(config)?))
    }
}

#[async_trait]
impl Sink for ClickHouseSink {
    fn name(&self) -> &str {
        SINK_TYPE
    }

    async fn connect(&mut self) -> ConnectorResult<()> {
        if self.client.is_some() {
            return Ok(());
        }

        let endpoint = self.endpoint();
        let ping_url = self
            .config
            .base_url()?
            .join("ping")
            .map_err(|e| ConnectorError::config(format!("Invalid ping URL: {}", e)))?;
        let insert_url = self.config.insert_url()?;

        let client = reqwest::Client::builder()
            .timeout(self.config.timeout())
            .build()
            .map_err(|e| {
                ConnectorError::connection_with_source(
                    endpoint.clone(),
                    "Failed to build HTTP client",
                    e,
                )
            })?;

        let response = client.get(ping_url).send().await.map_err(|e| {
            error!("Failed to connect to ClickHouse: {}", e);
            ConnectorError::connection_with_source(
                endpoint.clone(),
                format!("Failed to connect to ClickHouse: {}", e),
                e,
            )
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("ClickHouse ping returned {}: {}", status, body);
            return Err(ConnectorError::connection(
                endpoint,
                format!("ClickHouse ping returned {}: {}", status, body.trim()),
            ));
        }

        info!("Connected to ClickHouse at {}", endpoint);
        self.client = Some(client);
        self.insert_url = Some(insert_url);
        Ok(())
    }

    async fn write(&mut self, message: &str) -> ConnectorResult<()> {
        let (Some(client), Some(insert_url)) = (&self.client, &self.insert_url) else {
            return Err(ConnectorError::not_connected(
                SINK_TYPE,
                "Not connected to ClickHouse",
            ));
        };

        let row = Self::prepare_row(message)?;

        let mut request = client
            .post(insert_url.clone())
            .header("X-ClickHouse-User", &self.config.user)
            .body(row);
        if let Some(password) = &self.config.password {
            request = request.header("X-ClickHouse-Key", password);
        }

        let endpoint = self.endpoint();
        let response = request.send().await.map_err(|e| {
            error!("Failed to write to ClickHouse: {}", e);
            ConnectorError::write_with_source(
                endpoint.clone(),
                format!("Failed to write to ClickHouse: {}", e),
                e,
            )
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Failed to write to ClickHouse: {} {}", status, body);
            return Err(ConnectorError::write(
                endpoint,
                format!("Insert returned {}: {}", status, body.trim()),
            ));
        }

        debug!("Wrote 1 row to {}", self.config.qualified_table());
        Ok(())
    }

    async fn disconnect(&mut self) {
        self.insert_url = None;
        if self.client.take().is_some() {
            info!("Disconnected from ClickHouse");
        }
    }

    fn is_connected(&self) -> bool {
        self.client.is_some()
    }
}
