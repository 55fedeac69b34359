//! Configuration for the ClickHouse sink

use relay_connect_core::{parse_config, ConnectorError, ConnectorResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::LazyLock;
use std::time::Duration;
use url::Url;

pub(crate) static CONFIG_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "type": "object",
        "required": ["type", "host", "port", "database", "table", "user"],
        "properties": {
            "type": {"type": "string", "enum": [crate::SINK_TYPE]},
            "host": {"type": "string", "minLength": 1},
            "port": {"type": "integer", "minimum": 1, "maximum": 65535},
            "database": {"type": "string", "minLength": 1},
            "table": {"type": "string", "minLength": 1},
            "user": {"type": "string"},
            "password": {"type": "string"},
            "secure": {"type": "boolean"},
            "timeout_secs": {"type": "integer", "minimum": 1},
            "settings": {"type": "object", "additionalProperties": true},
        },
        "additionalProperties": false,
    })
});

/// ClickHouse sink configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClickHouseSinkConfig {
    /// Server host name
    pub host: String,

    /// HTTP interface port (8123 by default on a ClickHouse server)
    pub port: u16,

    /// Target database
    pub database: String,

    /// Target table, rows are inserted into `database.table`
    pub table: String,

    pub user: String,

    #[serde(default)]
    pub password: Option<String>,

    /// Use HTTPS instead of HTTP
    #[serde(default)]
    pub secure: bool,

    /// Request timeout for every HTTP call
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Server settings sent with every insert as query parameters
    #[serde(default)]
    pub settings: Map<String, Value>,
}

fn default_timeout() -> u64 {
    30
}

impl ClickHouseSinkConfig {
    pub(crate) fn from_value(config: Value) -> ConnectorResult<Self> {
        parse_config(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Fully qualified `database.table` name
    pub fn qualified_table(&self) -> String {
        format!("{}.{}", self.database, self.table)
    }

    /// Root URL of the HTTP interface
    pub fn base_url(&self) -> ConnectorResult<Url> {
        let scheme = if self.secure { "https" } else { "http" };
        Url::parse(&format!("{}://{}:{}/", scheme, self.host, self.port)).map_err(|e| {
            ConnectorError::config(format!(
                "Invalid ClickHouse address {}:{}: {}",
                self.host, self.port, e
            ))
        })
    }

    /// URL used to insert one or more `JSONEachRow` rows
    pub fn insert_url(&self) -> ConnectorResult<Url> {
        let mut url = self.base_url()?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("database", &self.database);
            query.append_pair(
                "query",
                &format!("INSERT INTO {} FORMAT JSONEachRow", self.qualified_table()),
            );
            for (key, value) in &self.settings {
                match value {
                    Value::String(s) => query.append_pair(key, s),
                    Value::Bool(b) => query.append_pair(key, if *b { "1" } else { "0" }),
                    other => query.append_pair(key, &other.to_string()),
                };
            }
        }
        Ok(url)
    }
}
