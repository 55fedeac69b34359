//! File sink connector for Relay Connect.
//!
//! Appends every event to a file as one line of JSON text.
//!
//! ```yaml
//! sink:
//!   type: file
//!   file_path: ticks.jsonl
//! ```

mod config;
mod connector;

pub use config::FileSinkConfig;
pub use connector::FileSink;

use relay_connect_core::{ConnectorRegistry, ConnectorResult};

/// Discriminator used in configuration
pub const SINK_TYPE: &str = "file";

/// Register the file sink with `registry`
pub fn register(registry: &mut ConnectorRegistry) -> ConnectorResult<()> {
    registry.register_sink::<FileSink>(SINK_TYPE)
}
