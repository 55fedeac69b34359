//! File sink implementation

use crate::config::{FileSinkConfig, CONFIG_SCHEMA};
use crate::SINK_TYPE;
use async_trait::async_trait;
use relay_connect_core::{Configurable, ConnectorError, ConnectorResult, Sink};
use serde_json::Value;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Sink appending one JSON line per event to a file
pub struct FileSink {
    config: FileSinkConfig,
    file: Option<File>,
    lines_written: u64,
}

impl FileSink {
    /// Create a file sink with configuration
    pub fn with_config(config: FileSinkConfig) -> Self {
        Self {
            config,
            file: None,
            lines_written: 0,
        }
    }

    pub fn config(&self) -> &FileSinkConfig {
        &self.config
    }

    /// Lines appended since the sink was created
    pub fn lines_written(&self) -> u64 {
        self.lines_written
    }
}

impl Configurable for FileSink {
    fn config_schema() -> &'static Value {
        &CONFIG_SCHEMA
    }

    fn from_config(config: Value) -> ConnectorResult<Self> {
        Ok(Self::with_config(FileSinkConfig::from_value(config)?))
    }
}

#[async_trait]
impl Sink for FileSink {
    fn name(&self) -> &str {
        SINK_TYPE
    }

    async fn connect(&mut self) -> ConnectorResult<()> {
        if self.file.is_some() {
            return Ok(());
        }

        let path = &self.config.file_path;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(|e| {
                ConnectorError::connection_with_source(
                    SINK_TYPE,
                    format!("Failed to open {}", path.display()),
                    e,
                )
            })?;

        info!("Opened file sink at {}", path.display());
        self.file = Some(file);
        Ok(())
    }

    async fn write(&mut self, message: &str) -> ConnectorResult<()> {
        let file = self.file.as_mut().ok_or_else(|| {
            ConnectorError::not_connected(SINK_TYPE, "Must connect before writing")
        })?;

        // One write_all per record so a line is never interleaved
        let mut line = String::with_capacity(message.len() + 1);
        line.push_str(message);
        line.push('\n');

        file.write_all(line.as_bytes()).await.map_err(|e| {
            ConnectorError::write_with_source(
                SINK_TYPE,
                format!("Failed to append to {}", self.config.file_path.display()),
                e,
            )
        })?;
        file.flush().await.map_err(|e| {
            ConnectorError::write_with_source(
                SINK_TYPE,
                format!("Failed to flush {}", self.config.file_path.display()),
                e,
            )
        })?;

        self.lines_written += 1;
        debug!("Appended line #{}", self.lines_written);
        Ok(())
    }

    async fn disconnect(&mut self) {
        let Some(mut file) = self.file.take() else {
            return;
        };

        if let Err(e) = file.flush().await {
            warn!(
                "Error flushing {} during disconnect: {}",
                self.config.file_path.display(),
                e
            );
        }
        info!(
            "Closed file sink at {} ({} lines written)",
            self.config.file_path.display(),
            self.lines_written
        );
    }

    fn is_connected(&self) -> bool {
        self.file.is_some()
    }
}
