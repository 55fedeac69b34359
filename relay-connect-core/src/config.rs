//! Configuration shared by the runtime and connector helpers.

use crate::{ConnectorError, ConnectorResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::env;
use std::str::FromStr;

/// Output format for log lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    #[serde(alias = "text")]
    Pretty,
    /// One JSON object per line
    Json,
}

impl FromStr for LogFormat {
    type Err = ConnectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(ConnectorError::config(format!(
                "Unknown log format '{}' (expected 'pretty' or 'json')",
                other
            ))),
        }
    }
}

/// Process-level settings for the streaming runtime
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeSettings {
    /// Log level filter used when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log output format
    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl RuntimeSettings {
    /// Apply environment variable overrides after loading from a file
    ///
    /// Environment variables:
    /// - `LOG_LEVEL`: Log level (default: info)
    /// - `LOG_FORMAT`: `pretty` or `json` (default: pretty)
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = env::var("LOG_LEVEL") {
            self.log_level = val;
        }
        if let Ok(val) = env::var("LOG_FORMAT") {
            if let Ok(format) = val.parse() {
                self.log_format = format;
            }
        }
    }

    /// Validate the settings
    pub fn validate(&self) -> ConnectorResult<()> {
        if self.log_level.trim().is_empty() {
            return Err(ConnectorError::config("log_level cannot be empty"));
        }
        Ok(())
    }
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

/// Deserialize a validated configuration mapping into a connector's typed config
pub fn parse_config<T: DeserializeOwned>(config: Value) -> ConnectorResult<T> {
    serde_json::from_value(config)
        .map_err(|e| ConnectorError::config(format!("Failed to parse connector config: {}", e)))
}
