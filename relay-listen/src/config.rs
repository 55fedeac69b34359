//! Top-level relay configuration file

use relay_connect_core::{schema, ConnectorError, ConnectorResult, RuntimeSettings};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::LazyLock;

static RELAY_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "type": "object",
        "required": ["source", "sink"],
        "properties": {
            "source": {"type": "object", "required": ["type"]},
            "sink": {"type": "object", "required": ["type"]},
            "runtime": {
                "type": "object",
                "properties": {
                    "log_level": {"type": "string", "minLength": 1},
                    "log_format": {"type": "string", "enum": ["pretty", "text", "json"]},
                },
                "additionalProperties": false,
            },
        },
        "additionalProperties": false,
    })
});

/// Format of a configuration document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Toml,
}

impl ConfigFormat {
    /// TOML for a `.toml` extension, YAML otherwise
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Yaml,
        }
    }
}

/// One source, one sink and the process settings
///
/// ```yaml
/// source:
///   type: coinbase
///   wss_url: wss://ws-feed.exchange.coinbase.com
///   subscription:
///     product_ids: [BTC-USD]
///     channels: [ticker]
/// sink:
///   type: file
///   file_path: ticks.jsonl
/// runtime:
///   log_level: info
///   log_format: json
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Source configuration mapping, validated by the source registry
    pub source: Value,

    /// Sink configuration mapping, validated by the sink registry
    pub sink: Value,

    #[serde(default)]
    pub runtime: RuntimeSettings,
}

impl RelayConfig {
    /// Load configuration from a file
    ///
    /// Environment overrides (`LOG_LEVEL`, `LOG_FORMAT`) are applied after
    /// the file is parsed.
    pub fn from_file(path: impl AsRef<Path>) -> ConnectorResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConnectorError::config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let mut config = Self::parse(&content, ConfigFormat::from_path(path))?;
        config.runtime.apply_env_overrides();
        config.runtime.validate()?;
        Ok(config)
    }

    /// Parse and validate a configuration document
    pub fn parse(content: &str, format: ConfigFormat) -> ConnectorResult<Self> {
        let document: Value = match format {
            ConfigFormat::Yaml => serde_yaml::from_str(content).map_err(|e| {
                ConnectorError::config(format!("Invalid YAML in config file: {}", e))
            })?,
            ConfigFormat::Toml => toml::from_str(content).map_err(|e| {
                ConnectorError::config(format!("Invalid TOML in config file: {}", e))
            })?,
        };

        schema::validate(&document, &RELAY_SCHEMA)?;

        serde_json::from_value(document)
            .map_err(|e| ConnectorError::config(format!("Failed to parse config file: {}", e)))
    }
}
