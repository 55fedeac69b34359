//! Configuration schema validation.
//!
//! Every connector type declares a JSON Schema document describing the
//! configuration mapping it accepts. The registry compiles that document once
//! at registration and validates each configuration against it before the
//! connector is constructed.

use crate::{ConnectorError, ConnectorResult};
use jsonschema::JSONSchema;
use serde_json::{json, Value};
use std::fmt;
use std::sync::LazyLock;

static BASE_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "type": "object",
        "required": ["type"],
        "properties": {"type": {"type": "string"}},
    })
});

/// Placeholder schema returned by connectors that do not declare their own.
///
/// Registration rejects any connector whose schema is this exact document.
pub fn base_schema() -> &'static Value {
    &BASE_SCHEMA
}

/// Returns true when `schema` is the base placeholder (identity, not equality)
pub fn is_base_schema(schema: &Value) -> bool {
    std::ptr::eq(schema, base_schema())
}

/// A schema document compiled for repeated validation
pub struct CompiledSchema {
    compiled: JSONSchema,
}

impl CompiledSchema {
    /// Compile a schema document
    pub fn compile(schema: &Value) -> ConnectorResult<Self> {
        let compiled = JSONSchema::compile(schema)
            .map_err(|e| ConnectorError::InvalidSchema(format!("{} at '{}'", e, e.schema_path)))?;
        Ok(Self { compiled })
    }

    /// Validate an instance, reporting the first violation by path.
    ///
    /// When more than one rule fails, the remaining violations are appended
    /// to the message so the operator can fix them in one pass.
    pub fn validate(&self, instance: &Value) -> ConnectorResult<()> {
        let violations: Vec<(String, String)> = match self.compiled.validate(instance) {
            Ok(()) => return Ok(()),
            Err(errors) => errors
                .map(|e| (e.instance_path.to_string(), e.to_string()))
                .collect(),
        };

        let mut iter = violations.into_iter();
        let Some((path, mut message)) = iter.next() else {
            return Ok(());
        };
        for (other_path, other_message) in iter {
            message.push_str(&format!("; at '{}': {}", other_path, other_message));
        }

        Err(ConnectorError::schema_violation(path, message))
    }
}

impl fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledSchema").finish_non_exhaustive()
    }
}

/// Validate `instance` against `schema` in one step
pub fn validate(instance: &Value, schema: &Value) -> ConnectorResult<()> {
    CompiledSchema::compile(schema)?.validate(instance)
}
