//! Capability contracts implemented by every connector.

use crate::schema::base_schema;
use crate::{ConnectorResult, Event};
use async_trait::async_trait;
use serde_json::Value;

/// Construction from a validated configuration mapping.
///
/// Every connector type declares its own schema. The default returns the
/// base placeholder, which the registry refuses to register.
pub trait Configurable: Sized {
    /// Schema the configuration mapping is validated against
    fn config_schema() -> &'static Value {
        base_schema()
    }

    /// Build an instance from a mapping that already passed `config_schema()`
    fn from_config(config: Value) -> ConnectorResult<Self>;
}

/// Trait for connectors producing events from an external feed
///
/// # Lifecycle
///
/// 1. `connect()` - open the transport and perform any handshake
/// 2. `receive()` - called repeatedly, one event per call
/// 3. `disconnect()` - release the transport
///
/// `disconnect()` must be a no-op on an instance that was never connected or
/// is already disconnected. `receive()` on a disconnected instance fails with
/// [`ConnectorError::NotConnected`](crate::ConnectorError::NotConnected).
///
/// # Example
///
/// ```rust,no_run
/// use async_trait::async_trait;
/// use relay_connect_core::{ConnectorError, ConnectorResult, Event, Source};
/// use serde_json::{json, Value};
///
/// pub struct CounterSource {
///     next: u64,
///     connected: bool,
/// }
///
/// #[async_trait]
/// impl Source for CounterSource {
///     fn name(&self) -> &str {
///         "counter"
///     }
///
///     async fn connect(&mut self) -> ConnectorResult<Value> {
///         self.connected = true;
///         Ok(json!({"type": "subscriptions"}))
///     }
///
///     async fn receive(&mut self) -> ConnectorResult<Event> {
///         if !self.connected {
///             return Err(ConnectorError::not_connected("counter", "Must connect first"));
///         }
///         self.next += 1;
///         Ok(Event::new(json!({"n": self.next})))
///     }
///
///     async fn disconnect(&mut self) {
///         self.connected = false;
///     }
///
///     fn is_connected(&self) -> bool {
///         self.connected
///     }
/// }
/// ```
#[async_trait]
pub trait Source: Send {
    /// Name used in logs and error messages, usually the discriminator
    fn name(&self) -> &str;

    /// Connect to the feed and return the handshake result
    async fn connect(&mut self) -> ConnectorResult<Value>;

    /// Receive the next event
    ///
    /// Fails with a `Receive` error when the transport is broken. Sources
    /// release their own transport before returning such an error.
    async fn receive(&mut self) -> ConnectorResult<Event>;

    /// Best-effort disconnect. Failures are logged, never returned.
    async fn disconnect(&mut self);

    /// Whether the source currently holds an open connection
    fn is_connected(&self) -> bool;
}

/// Trait for connectors persisting events to a destination
///
/// # Lifecycle
///
/// 1. `connect()` - open the destination
/// 2. `write()` - called once per event with its wire form
/// 3. `disconnect()` - flush and release the destination
///
/// A single `write()` call is treated as atomic: the record is either fully
/// written or the call fails.
#[async_trait]
pub trait Sink: Send {
    /// Name used in logs and error messages, usually the discriminator
    fn name(&self) -> &str;

    /// Open the destination
    async fn connect(&mut self) -> ConnectorResult<()>;

    /// Turn an event into the text handed to `write()`
    ///
    /// Defaults to [`Event::to_json_string`]. Sinks override this when they expect a
    /// different wire form.
    fn encode(&self, event: &Event) -> ConnectorResult<String> {
        event.to_json_string()
    }

    /// Persist one record
    async fn write(&mut self, message: &str) -> ConnectorResult<()>;

    /// Best-effort disconnect. Failures are logged, never returned.
    async fn disconnect(&mut self);

    /// Whether the sink currently holds an open destination
    fn is_connected(&self) -> bool;
}
