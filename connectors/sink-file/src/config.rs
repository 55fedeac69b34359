//! Configuration for the file sink

use relay_connect_core::{parse_config, ConnectorResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::LazyLock;

pub(crate) static CONFIG_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "type": "object",
        "required": ["type", "file_path"],
        "properties": {
            "type": {"type": "string", "enum": [crate::SINK_TYPE]},
            "file_path": {"type": "string", "minLength": 1},
        },
        "additionalProperties": false,
    })
});

/// File sink configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileSinkConfig {
    /// File the records are appended to, created if missing
    pub file_path: PathBuf,
}

impl FileSinkConfig {
    pub(crate) fn from_value(config: Value) -> ConnectorResult<Self> {
        parse_config(config)
    }
}
