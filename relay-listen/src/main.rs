//! Relay Listen
//!
//! Streams a live feed into a sink as described by a configuration file:
//!
//! ```bash
//! relay-listen --config relay.yaml
//! ```

use anyhow::Context;
use clap::Parser;
use relay_listen::{listen, RelayConfig};
use std::path::PathBuf;

/// Listen to a stream and push every event to a sink
#[derive(Parser, Debug)]
#[command(name = "relay-listen", version, about)]
struct Args {
    /// Path to configuration file (YAML, or TOML with a .toml extension)
    #[arg(short, long, value_parser = existing_file)]
    config: PathBuf,
}

fn existing_file(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    if path.is_file() {
        Ok(path)
    } else {
        Err(format!("File '{}' does not exist", value))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = RelayConfig::from_file(&args.config)
        .with_context(|| format!("Error reading config file {}", args.config.display()))?;

    let report = listen(config).await.context("Relay stopped with an error")?;

    tracing::info!(
        "Relay stopped after {} events ({})",
        report.events_relayed,
        report.final_state
    );
    Ok(())
}
