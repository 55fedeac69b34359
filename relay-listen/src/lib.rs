//! Relay a live market data feed into a sink.
//!
//! Loads a [`RelayConfig`], registers the built-in connectors and runs one
//! pipeline until interrupted or until an endpoint fails.

mod config;

pub use config::{ConfigFormat, RelayConfig};

use relay_connect_core::{ConnectorRegistry, ConnectorResult, RunReport, StreamRuntime};
use std::sync::Arc;
use tracing::info;

/// Registry with every connector shipped in this workspace
pub fn builtin_registry() -> ConnectorResult<ConnectorRegistry> {
    let mut registry = ConnectorRegistry::new();
    relay_source_coinbase::register(&mut registry)?;
    relay_sink_file::register(&mut registry)?;
    relay_sink_clickhouse::register(&mut registry)?;
    Ok(registry)
}

/// Run the relay described by `config` with the built-in connectors
pub async fn listen(config: RelayConfig) -> ConnectorResult<RunReport> {
    listen_with(builtin_registry()?, config).await
}

/// Run the relay described by `config` against a custom registry
pub async fn listen_with(
    registry: ConnectorRegistry,
    config: RelayConfig,
) -> ConnectorResult<RunReport> {
    let runtime = StreamRuntime::new(Arc::new(registry), config.runtime)?;
    info!("Relay Listen v{}", env!("CARGO_PKG_VERSION"));
    runtime.run(config.source, config.sink).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use relay_connect_core::{
        Configurable, ConnectorError, Event, Pipeline, RunState, RuntimeSettings, Source,
    };
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use tempfile::TempDir;
    use tokio_util::sync::CancellationToken;

    /// Yields its scripted events, then either fails or requests shutdown
    struct ReplaySource {
        events: VecDeque<Value>,
        on_exhausted: Option<CancellationToken>,
        connected: bool,
    }

    impl ReplaySource {
        fn new(events: Vec<Value>, on_exhausted: Option<CancellationToken>) -> Self {
            Self {
                events: events.into(),
                on_exhausted,
                connected: false,
            }
        }
    }

    impl Configurable for ReplaySource {
        fn config_schema() -> &'static Value {
            static SCHEMA: std::sync::LazyLock<Value> = std::sync::LazyLock::new(|| {
                json!({
                    "type": "object",
                    "required": ["type", "events"],
                    "properties": {
                        "type": {"type": "string", "enum": ["replay"]},
                        "events": {"type": "array"},
                    },
                    "additionalProperties": false,
                })
            });
            &SCHEMA
        }

        fn from_config(config: Value) -> ConnectorResult<Self> {
            let events = config["events"].as_array().cloned().unwrap_or_default();
            Ok(Self::new(events, None))
        }
    }

    #[async_trait]
    impl Source for ReplaySource {
        fn name(&self) -> &str {
            "replay"
        }

        async fn connect(&mut self) -> ConnectorResult<Value> {
            self.connected = true;
            Ok(json!({"type": "subscriptions"}))
        }

        async fn receive(&mut self) -> ConnectorResult<Event> {
            if let Some(event) = self.events.pop_front() {
                return Ok(Event::new(event));
            }
            match &self.on_exhausted {
                Some(token) => {
                    token.cancel();
                    std::future::pending().await
                }
                None => Err(ConnectorError::receive("replay", "feed closed")),
            }
        }

        async fn disconnect(&mut self) {
            self.connected = false;
        }

        fn is_connected(&self) -> bool {
            self.connected
        }
    }

    #[test]
    fn test_builtin_registry() {
        let registry = builtin_registry().unwrap();
        assert_eq!(registry.sources().types(), vec!["coinbase"]);
        assert_eq!(registry.sinks().types(), vec!["clickhouse_connect", "file"]);
    }

    #[tokio::test]
    async fn test_one_event_reaches_file_as_one_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.jsonl");
        let registry = builtin_registry().unwrap();

        let shutdown = CancellationToken::new();
        let source = ReplaySource::new(vec![json!({"price": "100"})], Some(shutdown.clone()));
        let sink = registry
            .get_sink(json!({"type": "file", "file_path": path}))
            .unwrap();

        let report = Pipeline::new(Box::new(source), sink)
            .run(shutdown)
            .await
            .unwrap();

        assert_eq!(report.events_relayed, 1);
        assert_eq!(report.final_state, RunState::Terminated);
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "{\"price\": \"100\"}\n");
    }

    #[tokio::test]
    async fn test_listen_returns_stream_failure_after_relaying() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ticks.jsonl");

        let mut registry = builtin_registry().unwrap();
        registry.register_source::<ReplaySource>("replay").unwrap();

        let config = RelayConfig {
            source: json!({
                "type": "replay",
                "events": [
                    {"type": "ticker", "price": "50000.00"},
                    {"type": "ticker", "price": "50001.00"},
                    {"type": "ticker", "price": "50002.00"},
                ],
            }),
            sink: json!({"type": "file", "file_path": path}),
            runtime: RuntimeSettings::default(),
        };

        let err = listen_with(registry, config).await.unwrap_err();
        assert!(err.is_stream_failure());

        let prices: Vec<Value> = std::fs::read_to_string(&path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str::<Value>(line).unwrap()["price"].clone())
            .collect();
        assert_eq!(prices, vec![json!("50000.00"), json!("50001.00"), json!("50002.00")]);
    }

    #[tokio::test]
    async fn test_listen_rejects_unknown_sink_before_connecting() {
        let config = RelayConfig {
            source: json!({
                "type": "coinbase",
                "wss_url": "ws://127.0.0.1:9",
                "subscription": {"product_ids": ["BTC-USD"], "channels": ["ticker"]},
            }),
            sink: json!({"type": "kafka"}),
            runtime: RuntimeSettings::default(),
        };

        let err = listen(config).await.unwrap_err();
        match err {
            ConnectorError::UnknownType { kind, type_name } => {
                assert_eq!(kind, "sink");
                assert_eq!(type_name, "kafka");
            }
            other => panic!("expected unknown sink type, got {:?}", other),
        }
    }
}
