//! Runtime for managing connector lifecycle.
//!
//! The runtime handles:
//! - Tracing initialization
//! - Building connectors from configuration through the registry
//! - Shutdown signal handling
//! - Driving a [`Pipeline`] for each source/sink pair

mod pipeline;

pub use pipeline::{Pipeline, RunReport, RunState};

use crate::{ConnectorRegistry, ConnectorResult, LogFormat, RuntimeSettings};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Runtime turning configuration mappings into running pipelines
///
/// Several pipelines may run concurrently from one runtime; each builds its
/// own connector instances and shares only the read-only registry and the
/// shutdown token.
pub struct StreamRuntime {
    registry: Arc<ConnectorRegistry>,
    settings: RuntimeSettings,
    shutdown: CancellationToken,
    signal_handler: Mutex<SignalHandler>,
}

/// Ctrl-c listener shared by the runs currently in flight
#[derive(Default)]
struct SignalHandler {
    active_runs: usize,
    task: Option<JoinHandle<()>>,
}

/// Keeps the ctrl-c listener alive for one run; the last guard dropped stops it
struct SignalGuard<'a> {
    handler: &'a Mutex<SignalHandler>,
}

impl Drop for SignalGuard<'_> {
    fn drop(&mut self) {
        let mut handler = self.handler.lock().unwrap_or_else(|e| e.into_inner());
        handler.active_runs = handler.active_runs.saturating_sub(1);
        if handler.active_runs == 0 {
            if let Some(task) = handler.task.take() {
                task.abort();
                debug!("Shutdown signal handler stopped");
            }
        }
    }
}

impl StreamRuntime {
    /// Create a new runtime
    pub fn new(
        registry: Arc<ConnectorRegistry>,
        settings: RuntimeSettings,
    ) -> ConnectorResult<Self> {
        // Validate configuration
        settings.validate()?;

        // Initialize tracing
        init_tracing(&settings);

        info!("Initializing Stream Runtime");
        info!("Registered sources: {:?}", registry.sources().types());
        info!("Registered sinks: {:?}", registry.sinks().types());

        Ok(Self {
            registry,
            settings,
            shutdown: CancellationToken::new(),
            signal_handler: Mutex::new(SignalHandler::default()),
        })
    }

    /// Token cancelled on shutdown; cancel it to stop every running pipeline
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn settings(&self) -> &RuntimeSettings {
        &self.settings
    }

    pub fn registry(&self) -> &ConnectorRegistry {
        &self.registry
    }

    /// Build both connectors before anything connects.
    ///
    /// Configuration errors for either endpoint surface here, before any
    /// network or disk access happens.
    pub fn build(&self, source_config: Value, sink_config: Value) -> ConnectorResult<Pipeline> {
        let source = self.registry.get_source(source_config)?;
        let sink = self.registry.get_sink(sink_config)?;
        Ok(Pipeline::new(source, sink))
    }

    /// Build and run one pipeline until shutdown or a fatal error
    pub async fn run(
        &self,
        source_config: Value,
        sink_config: Value,
    ) -> ConnectorResult<RunReport> {
        info!("Starting Stream Runtime");

        let pipeline = self.build(source_config, sink_config).map_err(|e| {
            error!("Invalid connector configuration: {}", e);
            e
        })?;

        // Setup shutdown handler
        let _signal_guard = self.setup_shutdown_handler();

        pipeline.run(self.shutdown.clone()).await
    }

    /// Setup shutdown signal handler for SIGINT
    ///
    /// One listener serves every concurrent run and is stopped when the last
    /// of them returns.
    fn setup_shutdown_handler(&self) -> SignalGuard<'_> {
        let mut handler = self.signal_handler.lock().unwrap_or_else(|e| e.into_inner());
        handler.active_runs += 1;
        if handler.task.is_none() {
            handler.task = Some(self.spawn_signal_listener());
        }
        SignalGuard {
            handler: &self.signal_handler,
        }
    }

    fn spawn_signal_listener(&self) -> JoinHandle<()> {
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            tokio::select! {
                signal = tokio::signal::ctrl_c() => match signal {
                    Ok(()) => {
                        info!("Received shutdown signal");
                        shutdown.cancel();
                    }
                    Err(e) => error!("Failed to listen for ctrl-c: {}", e),
                },
                _ = shutdown.cancelled() => {}
            }
        })
    }

    #[cfg(test)]
    fn signal_listener(&self) -> Option<tokio::task::AbortHandle> {
        let handler = self.signal_handler.lock().unwrap_or_else(|e| e.into_inner());
        handler.task.as_ref().map(JoinHandle::abort_handle)
    }
}

/// Initialize tracing/logging
///
/// `RUST_LOG` takes precedence over the configured level. Calling this more
/// than once is harmless.
pub fn init_tracing(settings: &RuntimeSettings) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = match settings.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init(),
    };

    if result.is_err() {
        debug!("Tracing subscriber already initialized");
    }
}
