//! Type registries mapping a configuration's `type` to a connector.
//!
//! Registration is an explicit start-up step: each connector crate exposes a
//! `register` function that the application calls once before any
//! configuration is processed. After that the registry is only read, so it
//! can be shared behind an `Arc` by any number of pipelines.

use crate::schema::{is_base_schema, CompiledSchema};
use crate::{Configurable, ConnectorError, ConnectorResult, Sink, Source};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info};

type Constructor<T> = Box<dyn Fn(Value) -> ConnectorResult<Box<T>> + Send + Sync>;

struct Registration<T: ?Sized> {
    schema: CompiledSchema,
    construct: Constructor<T>,
}

/// Mapping from discriminator to constructor for one connector kind
pub struct TypeRegistry<T: ?Sized> {
    kind: &'static str,
    entries: HashMap<String, Registration<T>>,
}

/// Registry of source connector types
pub type SourceRegistry = TypeRegistry<dyn Source>;

/// Registry of sink connector types
pub type SinkRegistry = TypeRegistry<dyn Sink>;

impl<T: ?Sized> TypeRegistry<T> {
    fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entries: HashMap::new(),
        }
    }

    /// Register a constructor under `discriminator`.
    ///
    /// Fails when `schema` is the base placeholder or does not compile.
    /// Registering an existing discriminator replaces the previous entry.
    pub fn register_with<F>(
        &mut self,
        discriminator: impl Into<String>,
        schema: &'static Value,
        construct: F,
    ) -> ConnectorResult<()>
    where
        F: Fn(Value) -> ConnectorResult<Box<T>> + Send + Sync + 'static,
    {
        let discriminator = discriminator.into();

        if is_base_schema(schema) {
            return Err(ConnectorError::registration(format!(
                "{} type '{}' must define its own config schema",
                self.kind, discriminator
            )));
        }

        let schema = CompiledSchema::compile(schema).map_err(|e| {
            ConnectorError::registration(format!(
                "{} type '{}' has an invalid config schema: {}",
                self.kind, discriminator, e
            ))
        })?;

        let replaced = self
            .entries
            .insert(
                discriminator.clone(),
                Registration {
                    schema,
                    construct: Box::new(construct),
                },
            )
            .is_some();

        if replaced {
            debug!("Replaced {} type registration: {}", self.kind, discriminator);
        } else {
            debug!("Registered {} type: {}", self.kind, discriminator);
        }

        Ok(())
    }

    /// Look up, validate and construct a connector from its configuration.
    ///
    /// The discriminator is resolved before any schema rule is checked, so an
    /// unknown type never reports violations from an unrelated schema.
    pub fn get(&self, config: Value) -> ConnectorResult<Box<T>> {
        let type_name = match config.get("type") {
            Some(Value::String(name)) => name.clone(),
            Some(_) => {
                return Err(ConnectorError::config(format!(
                    "{} configuration field 'type' must be a string",
                    self.kind
                )))
            }
            None if config.is_object() => {
                return Err(ConnectorError::config(format!(
                    "{} configuration is missing the 'type' field",
                    self.kind
                )))
            }
            None => {
                return Err(ConnectorError::config(format!(
                    "{} configuration must be a mapping",
                    self.kind
                )))
            }
        };

        let registration = self
            .entries
            .get(&type_name)
            .ok_or_else(|| ConnectorError::unknown_type(self.kind, type_name.clone()))?;

        registration.schema.validate(&config)?;

        let connector = (registration.construct)(config)?;
        info!("Created {} connector: {}", self.kind, type_name);
        Ok(connector)
    }

    /// Whether `discriminator` has a registered constructor
    pub fn contains(&self, discriminator: &str) -> bool {
        self.entries.contains_key(discriminator)
    }

    /// Registered discriminators, sorted
    pub fn types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }
}

impl TypeRegistry<dyn Source> {
    /// Register source type `C` under `discriminator`
    pub fn register<C>(&mut self, discriminator: impl Into<String>) -> ConnectorResult<()>
    where
        C: Source + Configurable + 'static,
    {
        self.register_with(discriminator, C::config_schema(), |config| {
            let source: Box<dyn Source> = Box::new(C::from_config(config)?);
            Ok(source)
        })
    }
}

impl TypeRegistry<dyn Sink> {
    /// Register sink type `C` under `discriminator`
    pub fn register<C>(&mut self, discriminator: impl Into<String>) -> ConnectorResult<()>
    where
        C: Sink + Configurable + 'static,
    {
        self.register_with(discriminator, C::config_schema(), |config| {
            let sink: Box<dyn Sink> = Box::new(C::from_config(config)?);
            Ok(sink)
        })
    }
}

impl<T: ?Sized> fmt::Debug for TypeRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("kind", &self.kind)
            .field("types", &self.types())
            .finish()
    }
}

/// Source and sink registries populated together at start-up
#[derive(Debug)]
pub struct ConnectorRegistry {
    sources: SourceRegistry,
    sinks: SinkRegistry,
}

impl ConnectorRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            sources: TypeRegistry::new("source"),
            sinks: TypeRegistry::new("sink"),
        }
    }

    /// Register source type `C` under `discriminator`
    pub fn register_source<C>(&mut self, discriminator: impl Into<String>) -> ConnectorResult<()>
    where
        C: Source + Configurable + 'static,
    {
        self.sources.register::<C>(discriminator)
    }

    /// Register sink type `C` under `discriminator`
    pub fn register_sink<C>(&mut self, discriminator: impl Into<String>) -> ConnectorResult<()>
    where
        C: Sink + Configurable + 'static,
    {
        self.sinks.register::<C>(discriminator)
    }

    /// Build a source from its configuration mapping
    pub fn get_source(&self, config: Value) -> ConnectorResult<Box<dyn Source>> {
        self.sources.get(config)
    }

    /// Build a sink from its configuration mapping
    pub fn get_sink(&self, config: Value) -> ConnectorResult<Box<dyn Sink>> {
        self.sinks.get(config)
    }

    pub fn sources(&self) -> &SourceRegistry {
        &self.sources
    }

    pub fn sinks(&self) -> &SinkRegistry {
        &self.sinks
    }

    pub fn sources_mut(&mut self) -> &mut SourceRegistry {
        &mut self.sources
    }

    pub fn sinks_mut(&mut self) -> &mut SinkRegistry {
        &mut self.sinks
    }
}

impl Default for ConnectorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Event;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::LazyLock;

    static NULL_SINK_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
        json!({
            "type": "object",
            "required": ["type", "label"],
            "properties": {
                "type": {"type": "string", "enum": ["null"]},
                "label": {"type": "string"},
            },
            "additionalProperties": false,
        })
    });

    static STATIC_SOURCE_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
        json!({
            "type": "object",
            "required": ["type"],
            "properties": {"type": {"type": "string", "enum": ["static"]}},
            "additionalProperties": false,
        })
    });

    struct NullSink {
        label: String,
        connected: bool,
    }

    impl Configurable for NullSink {
        fn config_schema() -> &'static Value {
            &NULL_SINK_SCHEMA
        }

        fn from_config(config: Value) -> ConnectorResult<Self> {
            Ok(Self {
                label: config["label"].as_str().unwrap_or_default().to_string(),
                connected: false,
            })
        }
    }

    #[async_trait]
    impl Sink for NullSink {
        fn name(&self) -> &str {
            &self.label
        }

        async fn connect(&mut self) -> ConnectorResult<()> {
            self.connected = true;
            Ok(())
        }

        async fn write(&mut self, _message: &str) -> ConnectorResult<()> {
            Ok(())
        }

        async fn disconnect(&mut self) {
            self.connected = false;
        }

        fn is_connected(&self) -> bool {
            self.connected
        }
    }

    struct StaticSource;

    impl Configurable for StaticSource {
        fn config_schema() -> &'static Value {
            &STATIC_SOURCE_SCHEMA
        }

        fn from_config(_config: Value) -> ConnectorResult<Self> {
            Ok(Self)
        }
    }

    #[async_trait]
    impl Source for StaticSource {
        fn name(&self) -> &str {
            "static"
        }

        async fn connect(&mut self) -> ConnectorResult<Value> {
            Ok(json!({}))
        }

        async fn receive(&mut self) -> ConnectorResult<Event> {
            Ok(Event::new(json!({"static": true})))
        }

        async fn disconnect(&mut self) {}

        fn is_connected(&self) -> bool {
            false
        }
    }

    /// Forgets to declare a schema
    struct ForgetfulSource;

    impl Configurable for ForgetfulSource {
        fn from_config(_config: Value) -> ConnectorResult<Self> {
            Ok(Self)
        }
    }

    #[async_trait]
    impl Source for ForgetfulSource {
        fn name(&self) -> &str {
            "forgetful"
        }

        async fn connect(&mut self) -> ConnectorResult<Value> {
            Ok(Value::Null)
        }

        async fn receive(&mut self) -> ConnectorResult<Event> {
            Err(ConnectorError::not_connected("forgetful", "never"))
        }

        async fn disconnect(&mut self) {}

        fn is_connected(&self) -> bool {
            false
        }
    }

    fn registry() -> ConnectorRegistry {
        let mut registry = ConnectorRegistry::new();
        registry.register_source::<StaticSource>("static").unwrap();
        registry.register_sink::<NullSink>("null").unwrap();
        registry
    }

    #[test]
    fn test_get_registered_types() {
        let registry = registry();

        let sink = registry
            .get_sink(json!({"type": "null", "label": "audit"}))
            .unwrap();
        assert_eq!(sink.name(), "audit");
        assert!(!sink.is_connected());

        let source = registry.get_source(json!({"type": "static"})).unwrap();
        assert_eq!(source.name(), "static");
    }

    #[test]
    fn test_unknown_type_wins_over_schema() {
        let registry = registry();

        // Fields that would violate every registered schema still report the type
        let err = registry
            .get_sink(json!({"type": "kafka", "label": 7, "bogus": true}))
            .err().unwrap();
        match err {
            ConnectorError::UnknownType { kind, type_name } => {
                assert_eq!(kind, "sink");
                assert_eq!(type_name, "kafka");
            }
            other => panic!("unexpected error: {:?}", other),
        }

        // Source and sink registries are separate
        assert!(matches!(
            registry.get_source(json!({"type": "null", "label": "x"})),
            Err(ConnectorError::UnknownType { .. })
        ));
    }

    #[test]
    fn test_missing_required_field() {
        let registry = registry();
        let err = registry.get_sink(json!({"type": "null"})).err().unwrap();
        match err {
            ConnectorError::SchemaViolation { message, .. } => {
                assert!(message.contains("label"), "{}", message)
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_malformed_configs() {
        let registry = registry();
        assert!(matches!(
            registry.get_sink(json!({"label": "x"})),
            Err(ConnectorError::Config(_))
        ));
        assert!(matches!(
            registry.get_sink(json!({"type": 3})),
            Err(ConnectorError::Config(_))
        ));
        assert!(matches!(
            registry.get_sink(json!(["type", "null"])),
            Err(ConnectorError::Config(_))
        ));
    }

    #[test]
    fn test_registration_requires_own_schema() {
        let mut registry = ConnectorRegistry::new();
        let err = registry
            .register_source::<ForgetfulSource>("forgetful")
            .unwrap_err();
        assert!(err.is_registration());
        assert!(err.to_string().contains("forgetful"));
        assert!(!registry.sources().contains("forgetful"));
    }

    #[test]
    fn test_registration_rejects_invalid_schema() {
        static BROKEN: LazyLock<Value> = LazyLock::new(|| json!({"type": 12}));

        let mut registry = ConnectorRegistry::new();
        let err = registry
            .sinks_mut()
            .register_with("broken", &BROKEN, |_| {
                Err(ConnectorError::config("unreachable"))
            })
            .unwrap_err();
        assert!(err.is_registration());
    }

    #[test]
    fn test_reregistration_overwrites() {
        let mut registry = registry();
        registry
            .sinks_mut()
            .register_with("null", &NULL_SINK_SCHEMA, |_| {
                Err(ConnectorError::config("replacement constructor"))
            })
            .unwrap();

        let err = registry
            .get_sink(json!({"type": "null", "label": "x"}))
            .err().unwrap();
        assert!(err.to_string().contains("replacement constructor"));
        assert_eq!(registry.sinks().types(), vec!["null"]);
    }

    #[test]
    fn test_types_sorted() {
        let mut registry = registry();
        registry.register_sink::<NullSink>("another").unwrap();
        assert_eq!(registry.sinks().types(), vec!["another", "null"]);
        assert_eq!(registry.sources().types(), vec!["static"]);
    }
}
