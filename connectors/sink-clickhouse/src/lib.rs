//! ClickHouse sink connector for Relay Connect.
//!
//! Inserts every event as one row through the ClickHouse HTTP interface,
//! using the `JSONEachRow` input format. Known Coinbase ticker fields are
//! coerced to their column types before the insert; any other field is
//! passed through unchanged.
//!
//! ```yaml
//! sink:
//!   type: clickhouse_connect
//!   host: localhost
//!   port: 8123
//!   database: coinbase
//!   table: ticks
//!   user: default
//!   password: ""
//!   settings:
//!     async_insert: 1
//! ```

mod coerce;
mod config;
mod connector;

pub use coerce::{coerce_row, FieldKind, FIELD_KINDS};
pub use config::ClickHouseSinkConfig;
pub use connector::ClickHouseSink;

use relay_connect_core::{ConnectorRegistry, ConnectorResult};

/// Discriminator used in configuration
pub const SINK_TYPE: &str = "clickhouse_connect";

/// Register the ClickHouse sink with `registry`
pub fn register(registry: &mut ConnectorRegistry) -> ConnectorResult<()> {
    registry.register_sink::<ClickHouseSink>(SINK_TYPE)
}
