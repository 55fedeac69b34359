//! One source/sink run: connect, relay until stopped, disconnect.

use crate::{ConnectorError, ConnectorResult, RelayMetrics, Sink, Source};
use serde_json::Value;
use std::fmt;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Lifecycle state of a pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    SourceConnecting,
    SinkConnecting,
    Streaming,
    Draining,
    Terminated,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Idle => "idle",
            RunState::SourceConnecting => "source-connecting",
            RunState::SinkConnecting => "sink-connecting",
            RunState::Streaming => "streaming",
            RunState::Draining => "draining",
            RunState::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// Summary of a run that ended on a shutdown request
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Handshake result returned by the source's `connect()`
    pub handshake: Value,
    /// Number of events written to the sink
    pub events_relayed: u64,
    /// Always `Terminated` once `run` returns
    pub final_state: RunState,
}

/// A source paired with a sink for exactly one run.
///
/// The pipeline owns both connectors and is consumed by [`Pipeline::run`], so
/// a terminated pipeline can never be restarted. Every connector whose
/// `connect()` succeeded receives exactly one `disconnect()` call, sink first.
pub struct Pipeline {
    source: Box<dyn Source>,
    sink: Box<dyn Sink>,
    metrics: RelayMetrics,
    state: RunState,
}

impl Pipeline {
    /// Pair a source with a sink
    pub fn new(source: Box<dyn Source>, sink: Box<dyn Sink>) -> Self {
        let metrics = RelayMetrics::new(source.name(), sink.name());
        Self {
            source,
            sink,
            metrics,
            state: RunState::Idle,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Run the pipeline until `shutdown` is cancelled or an endpoint fails.
    ///
    /// Returns the connect, receive or write error that ended the run, after
    /// the drain sequence has completed. A run stopped by `shutdown` returns
    /// a [`RunReport`].
    pub async fn run(mut self, shutdown: CancellationToken) -> ConnectorResult<RunReport> {
        info!(
            source = self.source.name(),
            sink = self.sink.name(),
            "Starting pipeline"
        );

        // 1. Connect source; nothing to clean up if this fails
        self.transition(RunState::SourceConnecting);
        let handshake = match self.source.connect().await {
            Ok(handshake) => handshake,
            Err(e) => {
                error!("Failed to connect source {}: {}", self.source.name(), e);
                self.metrics.record_error(e.kind());
                self.transition(RunState::Terminated);
                return Err(e);
            }
        };
        info!("Source {} connected", self.source.name());
        debug!("Source handshake: {}", handshake);

        // 2. Connect sink; the source is already open and must be released
        self.transition(RunState::SinkConnecting);
        if let Err(e) = self.sink.connect().await {
            error!("Failed to connect sink {}: {}", self.sink.name(), e);
            self.metrics.record_error(e.kind());
            self.transition(RunState::Draining);
            self.disconnect_source().await;
            self.transition(RunState::Terminated);
            return Err(e);
        }
        info!("Sink {} connected", self.sink.name());

        // 3. Relay until stopped
        self.transition(RunState::Streaming);
        self.metrics.set_up(true);
        let outcome = self.relay(&shutdown).await;
        self.metrics.set_up(false);

        // 4. Drain: sink first, it was opened last
        self.transition(RunState::Draining);
        self.disconnect_sink().await;
        self.disconnect_source().await;
        self.transition(RunState::Terminated);

        match outcome {
            Ok(events_relayed) => {
                info!("Pipeline stopped after relaying {} events", events_relayed);
                Ok(RunReport {
                    handshake,
                    events_relayed,
                    final_state: self.state,
                })
            }
            Err(e) => {
                error!("Pipeline terminated: {}", e);
                Err(e)
            }
        }
    }

    /// Relay events one at a time, in receive order
    async fn relay(&mut self, shutdown: &CancellationToken) -> ConnectorResult<u64> {
        info!("Entering relay loop");
        let mut relayed: u64 = 0;

        loop {
            let received = tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!("Shutdown requested while waiting for the next event");
                    return Ok(relayed);
                }
                received = self.source.receive() => received,
            };

            let event = received.map_err(|e| self.stream_failure("receive", e))?;
            self.metrics.record_received();

            if shutdown.is_cancelled() {
                info!("Shutdown requested, dropping event received before the write");
                return Ok(relayed);
            }

            let message = self
                .sink
                .encode(&event)
                .map_err(|e| self.stream_failure("encode", e))?;

            let start = Instant::now();
            self.sink
                .write(&message)
                .await
                .map_err(|e| self.stream_failure("write", e))?;
            self.metrics.record_written(start.elapsed());

            relayed += 1;
            debug!("Relayed event #{}", relayed);
        }
    }

    fn stream_failure(&self, step: &str, e: ConnectorError) -> ConnectorError {
        error!("Stream {} failed: {}", step, e);
        self.metrics.record_error(e.kind());
        e
    }

    async fn disconnect_sink(&mut self) {
        info!("Disconnecting sink {}", self.sink.name());
        self.sink.disconnect().await;
    }

    async fn disconnect_source(&mut self) {
        info!("Disconnecting source {}", self.source.name());
        self.source.disconnect().await;
    }

    fn transition(&mut self, next: RunState) {
        debug!("Pipeline state: {} -> {}", self.state, next);
        self.state = next;
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("source", &self.source.name())
            .field("sink", &self.sink.name())
            .field("state", &self.state)
            .finish()
    }
}
