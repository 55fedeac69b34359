//! Event representation passed from sources to sinks.
//!
//! An [`Event`] is an opaque JSON record. The framework never inspects its
//! shape; sinks decide which fields they understand.

use crate::{ConnectorError, ConnectorResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::ser::Formatter;
use serde_json::Value;
use std::io;

/// One record produced by a source
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    payload: Value,
}

impl Event {
    /// Wrap an already parsed JSON value
    pub fn new(payload: Value) -> Self {
        Self { payload }
    }

    /// Parse an event from JSON text received on the wire
    pub fn from_json_str(text: &str) -> ConnectorResult<Self> {
        serde_json::from_str(text)
            .map(Self::new)
            .map_err(|e| ConnectorError::invalid_data(format!("Invalid JSON: {}", e), text))
    }

    /// Parse an event from raw JSON bytes
    pub fn from_json_slice(bytes: &[u8]) -> ConnectorResult<Self> {
        serde_json::from_slice(bytes).map(Self::new).map_err(|e| {
            ConnectorError::invalid_data(
                format!("Invalid JSON: {}", e),
                String::from_utf8_lossy(bytes),
            )
        })
    }

    /// Create an event from any JSON-serializable object
    pub fn from_serializable<T: Serialize>(data: &T) -> ConnectorResult<Self> {
        let payload =
            serde_json::to_value(data).map_err(|e| ConnectorError::Serialization(e.to_string()))?;
        Ok(Self::new(payload))
    }

    /// Borrow the JSON payload
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Take the JSON payload
    pub fn into_payload(self) -> Value {
        self.payload
    }

    /// The `type` field many feeds use to tag their messages (e.g. `ticker`)
    pub fn event_type(&self) -> Option<&str> {
        self.payload.get("type").and_then(Value::as_str)
    }

    /// Get a top-level field
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }

    /// Deserialize the payload into a typed record
    pub fn payload_as<T: DeserializeOwned>(&self) -> ConnectorResult<T> {
        serde_json::from_value(self.payload.clone()).map_err(|e| {
            ConnectorError::invalid_data(
                format!("Failed to deserialize event: {}", e),
                self.payload.to_string(),
            )
        })
    }

    /// Default wire form: one record of UTF-8 JSON text with `", "` and
    /// `": "` separators, e.g. `{"price": "100"}`
    pub fn to_json_string(&self) -> ConnectorResult<String> {
        let mut buf = Vec::with_capacity(128);
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
        self.payload
            .serialize(&mut ser)
            .map_err(|e| ConnectorError::Serialization(e.to_string()))?;
        String::from_utf8(buf).map_err(|e| ConnectorError::Serialization(e.to_string()))
    }
}

/// Single-line JSON with a space after every `,` and `:`
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

impl From<Value> for Event {
    fn from(payload: Value) -> Self {
        Self::new(payload)
    }
}
