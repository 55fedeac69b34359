//! Pipeline metrics exported through the `metrics` facade.
//!
//! No recorder is installed here; the application decides where metrics go.

use metrics::{counter, gauge, histogram, Counter, Gauge, Histogram};
use std::time::Duration;

/// Metric handles for one source/sink pair
#[derive(Clone)]
pub struct RelayMetrics {
    source: String,
    sink: String,
    received: Counter,
    written: Counter,
    write_duration: Histogram,
    up: Gauge,
}

impl RelayMetrics {
    pub fn new(source: &str, sink: &str) -> Self {
        Self {
            source: source.to_string(),
            sink: sink.to_string(),
            received: counter!(
                "relay_events_received_total",
                "source" => source.to_string(),
                "sink" => sink.to_string()
            ),
            written: counter!(
                "relay_events_written_total",
                "source" => source.to_string(),
                "sink" => sink.to_string()
            ),
            write_duration: histogram!(
                "relay_write_duration_seconds",
                "source" => source.to_string(),
                "sink" => sink.to_string()
            ),
            up: gauge!(
                "relay_pipeline_up",
                "source" => source.to_string(),
                "sink" => sink.to_string()
            ),
        }
    }

    pub fn record_received(&self) {
        self.received.increment(1);
    }

    pub fn record_written(&self, duration: Duration) {
        self.written.increment(1);
        self.write_duration.record(duration.as_secs_f64());
    }

    pub fn record_error(&self, kind: &'static str) {
        counter!(
            "relay_errors_total",
            "source" => self.source.clone(),
            "sink" => self.sink.clone(),
            "kind" => kind
        )
        .increment(1);
    }

    pub fn set_up(&self, up: bool) {
        self.up.set(if up { 1.0 } else { 0.0 });
    }
}

impl std::fmt::Debug for RelayMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayMetrics")
            .field("source", &self.source)
            .field("sink", &self.sink)
            .finish()
    }
}
