//! Configuration for the Coinbase source

use relay_connect_core::{parse_config, ConnectorResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::LazyLock;
use std::time::Duration;

/// Channels the Coinbase Exchange feed accepts
pub const CHANNELS: &[&str] = &[
    "heartbeat",
    "status",
    "ticker",
    "ticker_batch",
    "level2",
    "level2_batch",
    "full",
    "user",
    "matches",
    "auctionfeed",
    "rfq_matches",
];

pub(crate) static CONFIG_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "type": "object",
        "required": ["type", "wss_url", "subscription"],
        "properties": {
            "type": {"type": "string", "enum": [crate::SOURCE_TYPE]},
            "name": {"type": "string"},
            "wss_url": {"type": "string", "pattern": "^wss?://"},
            "handshake_timeout_secs": {"type": "integer", "minimum": 1},
            "subscription": {
                "type": "object",
                "required": ["product_ids", "channels"],
                "properties": {
                    "product_ids": {
                        "type": "array",
                        "minItems": 1,
                        "uniqueItems": true,
                        "items": {"type": "string", "pattern": "^[A-Z0-9]+-[A-Z0-9]+$"},
                    },
                    "channels": {
                        "type": "array",
                        "minItems": 1,
                        "uniqueItems": true,
                        "items": {"type": "string", "enum": CHANNELS},
                    },
                },
                "additionalProperties": false,
            },
        },
        "additionalProperties": false,
    })
});

/// Coinbase source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoinbaseSourceConfig {
    /// Optional human-readable name of the feed
    pub name: Option<String>,

    /// WebSocket endpoint, e.g. `wss://ws-feed.exchange.coinbase.com`
    pub wss_url: String,

    /// Products and channels to subscribe to
    pub subscription: Subscription,

    /// Time allowed for connecting and receiving the subscription confirmation
    #[serde(default = "default_handshake_timeout")]
    pub handshake_timeout_secs: u64,
}

fn default_handshake_timeout() -> u64 {
    10
}

impl CoinbaseSourceConfig {
    pub(crate) fn from_value(config: Value) -> ConnectorResult<Self> {
        parse_config(config)
    }

    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_secs(self.handshake_timeout_secs)
    }

    /// The subscribe request sent right after the socket opens
    pub fn subscribe_message(&self) -> Value {
        json!({
            "type": "subscribe",
            "product_ids": self.subscription.product_ids,
            "channels": self.subscription.channels,
        })
    }
}

/// Subscription request parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    /// Products such as `BTC-USD`
    pub product_ids: Vec<String>,
    /// Channels such as `ticker` or `heartbeat`
    pub channels: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_connect_core::schema;
    use relay_connect_core::ConnectorError;

    fn valid_config() -> Value {
        json!({
            "name": "coinbase_bitcoin_ticker",
            "wss_url": "wss://ws-feed.exchange.coinbase.com",
            "type": "coinbase",
            "subscription": {"product_ids": ["BTC-USD"], "channels": ["ticker"]},
        })
    }

    fn violation_path(config: &Value) -> String {
        match schema::validate(config, &CONFIG_SCHEMA) {
            Err(ConnectorError::SchemaViolation { path, .. }) => path,
            other => panic!("expected schema violation, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_config() {
        let value = valid_config();
        assert!(schema::validate(&value, &CONFIG_SCHEMA).is_ok());

        let config = CoinbaseSourceConfig::from_value(value).unwrap();
        assert_eq!(config.name.as_deref(), Some("coinbase_bitcoin_ticker"));
        assert_eq!(config.handshake_timeout(), Duration::from_secs(10));
        assert_eq!(config.subscription.product_ids, vec!["BTC-USD"]);
    }

    #[test]
    fn test_subscribe_message() {
        let config = CoinbaseSourceConfig::from_value(valid_config()).unwrap();
        assert_eq!(
            config.subscribe_message(),
            json!({"type": "subscribe", "product_ids": ["BTC-USD"], "channels": ["ticker"]})
        );
    }

    #[test]
    fn test_missing_required_fields() {
        let mut config = valid_config();
        config.as_object_mut().unwrap().remove("wss_url");
        match schema::validate(&config, &CONFIG_SCHEMA) {
            Err(ConnectorError::SchemaViolation { message, .. }) => {
                assert!(message.contains("wss_url"), "{}", message);
                assert!(message.contains("required property"), "{}", message);
            }
            other => panic!("expected schema violation, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_channel() {
        let mut config = valid_config();
        config["subscription"]["channels"] = json!(["ticker", "trades"]);
        assert_eq!(violation_path(&config), "/subscription/channels/1");
    }

    #[test]
    fn test_product_id_constraints() {
        let mut config = valid_config();
        config["subscription"]["product_ids"] = json!([]);
        assert_eq!(violation_path(&config), "/subscription/product_ids");

        config["subscription"]["product_ids"] = json!(["BTC-USD", "BTC-USD"]);
        assert_eq!(violation_path(&config), "/subscription/product_ids");

        config["subscription"]["product_ids"] = json!(["btc-usd"]);
        assert_eq!(violation_path(&config), "/subscription/product_ids/0");
    }

    #[test]
    fn test_wrong_type_discriminator() {
        let mut config = valid_config();
        config["type"] = json!("kraken");
        assert_eq!(violation_path(&config), "/type");
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let mut config = valid_config();
        config["api_key"] = json!("secret");
        assert_eq!(violation_path(&config), "");

        let mut config = valid_config();
        config["subscription"]["depth"] = json!(10);
        assert_eq!(violation_path(&config), "/subscription");
    }

    #[test]
    fn test_url_scheme() {
        let mut config = valid_config();
        config["wss_url"] = json!("https://ws-feed.exchange.coinbase.com");
        assert_eq!(violation_path(&config), "/wss_url");
    }
}
