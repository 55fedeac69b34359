//! # Relay Connect Core
//!
//! Core framework for relaying a live event feed into a durable destination.
//!
//! A relay pairs exactly one **source** (an external feed, such as an exchange
//! WebSocket) with exactly one **sink** (a file, a columnar store) and moves
//! every event from one to the other, in order, until it is interrupted or an
//! endpoint fails.
//!
//! ## Overview
//!
//! - [`Source`] / [`Sink`]: the capability contracts every connector implements
//! - [`Configurable`]: per-type configuration schema and constructor
//! - [`ConnectorRegistry`]: maps a configuration's `type` to a connector,
//!   validating the configuration against that connector's schema first
//! - [`Pipeline`]: the connect → relay → drain state machine for one pair
//! - [`StreamRuntime`]: builds pipelines from configuration and handles shutdown
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use relay_connect_core::{ConnectorRegistry, ConnectorResult, RuntimeSettings, StreamRuntime};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # async fn run() -> ConnectorResult<()> {
//! let mut registry = ConnectorRegistry::new();
//! // Each connector crate registers its types here, once, at start-up:
//! // relay_sink_file::register(&mut registry)?;
//!
//! let runtime = StreamRuntime::new(Arc::new(registry), RuntimeSettings::default())?;
//! let report = runtime
//!     .run(
//!         json!({"type": "coinbase", "wss_url": "wss://ws-feed.exchange.coinbase.com",
//!                "subscription": {"product_ids": ["BTC-USD"], "channels": ["ticker"]}}),
//!         json!({"type": "file", "file_path": "ticks.jsonl"}),
//!     )
//!     .await?;
//! println!("relayed {} events", report.events_relayed);
//! # Ok(())
//! # }
//! ```
//!
//! ## Guarantees
//!
//! - Configuration is validated for both endpoints before anything connects
//! - Every endpoint whose `connect()` succeeded is disconnected exactly once
//! - Events reach the sink in the order the source produced them
//! - Mid-stream failures end the run and are returned to the caller, never retried

mod config;
mod error;
mod message;
mod metrics;
mod registry;
mod runtime;
pub mod schema;
mod traits;

// Re-export public API
pub use config::{parse_config, LogFormat, RuntimeSettings};
pub use error::{BoxError, ConnectorError, ConnectorResult};
pub use message::Event;
pub use metrics::RelayMetrics;
pub use registry::{ConnectorRegistry, SinkRegistry, SourceRegistry, TypeRegistry};
pub use runtime::{init_tracing, Pipeline, RunReport, RunState, StreamRuntime};
pub use traits::{Configurable, Sink, Source};

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
