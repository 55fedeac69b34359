//! Error types shared by the framework and every connector.

use thiserror::Error;

/// Boxed error used to keep the underlying cause of a connector failure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type for connector and framework operations
pub type ConnectorResult<T> = Result<T, ConnectorError>;

/// Errors raised while configuring, connecting or streaming
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// Malformed configuration that is not tied to one schema rule
    #[error("Configuration error: {0}")]
    Config(String),

    /// The configuration names a connector type nobody registered
    #[error("Unknown {kind} type: {type_name}")]
    UnknownType { kind: &'static str, type_name: String },

    /// The configuration does not conform to the connector's schema
    #[error("Invalid configuration at '{path}': {message}")]
    SchemaViolation { path: String, message: String },

    /// A connector type was registered without a usable schema
    #[error("Registration error: {0}")]
    Registration(String),

    /// A schema document that cannot be compiled
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    /// Connect-time failure on either endpoint
    #[error("Connection to {endpoint} failed: {message}")]
    Connection {
        endpoint: String,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The source transport broke while streaming
    #[error("Receive from {endpoint} failed: {message}")]
    Receive {
        endpoint: String,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The sink could not persist a record
    #[error("Write to {endpoint} failed: {message}")]
    Write {
        endpoint: String,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// `receive` or `write` called on a connector that is not connected
    #[error("{endpoint} is not connected: {message}")]
    NotConnected { endpoint: String, message: String },

    /// A record the sink does not know how to interpret
    #[error("Invalid data: {message}")]
    InvalidData { message: String, payload: String },

    /// An event that could not be turned into its wire form
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ConnectorError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn unknown_type(kind: &'static str, type_name: impl Into<String>) -> Self {
        Self::UnknownType {
            kind,
            type_name: type_name.into(),
        }
    }

    pub fn schema_violation(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SchemaViolation {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn registration(msg: impl Into<String>) -> Self {
        Self::Registration(msg.into())
    }

    pub fn connection(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connection {
            endpoint: endpoint.into(),
            message: message.into(),
            source: None,
        }
    }

    pub fn connection_with_source(
        endpoint: impl Into<String>,
        message: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::Connection {
            endpoint: endpoint.into(),
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn receive(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Receive {
            endpoint: endpoint.into(),
            message: message.into(),
            source: None,
        }
    }

    pub fn receive_with_source(
        endpoint: impl Into<String>,
        message: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::Receive {
            endpoint: endpoint.into(),
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn write(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Write {
            endpoint: endpoint.into(),
            message: message.into(),
            source: None,
        }
    }

    pub fn write_with_source(
        endpoint: impl Into<String>,
        message: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::Write {
            endpoint: endpoint.into(),
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn not_connected(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NotConnected {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    pub fn invalid_data(message: impl Into<String>, payload: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
            payload: payload.into(),
        }
    }

    /// Errors that must be reported before any connection is attempted
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::UnknownType { .. } | Self::SchemaViolation { .. }
        )
    }

    /// Start-up faults in how connectors were assembled
    pub fn is_registration(&self) -> bool {
        matches!(self, Self::Registration(_) | Self::InvalidSchema(_))
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }

    pub fn is_not_connected(&self) -> bool {
        matches!(self, Self::NotConnected { .. })
    }

    /// Mid-stream failures that end a run after draining
    pub fn is_stream_failure(&self) -> bool {
        matches!(
            self,
            Self::Receive { .. }
                | Self::Write { .. }
                | Self::InvalidData { .. }
                | Self::Serialization(_)
                | Self::NotConnected { .. }
        )
    }

    /// Short label used for the `kind` metric label
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) | Self::UnknownType { .. } | Self::SchemaViolation { .. } => "config",
            Self::Registration(_) | Self::InvalidSchema(_) => "registration",
            Self::Connection { .. } => "connection",
            Self::Receive { .. } => "receive",
            Self::Write { .. } | Self::InvalidData { .. } | Self::Serialization(_) => "write",
            Self::NotConnected { .. } => "not_connected",
        }
    }
}
