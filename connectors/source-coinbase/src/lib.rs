//! Coinbase Exchange WebSocket source connector for Relay Connect.
//!
//! Connects to the Coinbase Exchange market data feed, subscribes to the
//! configured products and channels, and yields every feed message as an
//! event.
//!
//! ```yaml
//! source:
//!   type: coinbase
//!   name: coinbase_bitcoin_ticker
//!   wss_url: wss://ws-feed.exchange.coinbase.com
//!   subscription:
//!     product_ids: [BTC-USD]
//!     channels: [ticker]
//! ```

mod config;
mod connector;

pub use config::{CoinbaseSourceConfig, Subscription, CHANNELS};
pub use connector::CoinbaseSource;

use relay_connect_core::{ConnectorRegistry, ConnectorResult};

/// Discriminator used in configuration
pub const SOURCE_TYPE: &str = "coinbase";

/// Register the Coinbase source with `registry`
pub fn register(registry: &mut ConnectorRegistry) -> ConnectorResult<()> {
    registry.register_source::<CoinbaseSource>(SOURCE_TYPE)
}
