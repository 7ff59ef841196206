//! Key-value reader over one sensor's settings section.
//!
//! Sensors never see raw JSON; they pull typed fields through
//! [`ConfigSection`], which reports failures as
//! [`ProbeError::InvalidConfig`] naming the dotted field path.

use serde_json::{Map, Value};

use crate::error::ProbeError;

/// Named view over a JSON object holding settings for one sensor.
#[derive(Debug, Clone)]
pub struct ConfigSection {
    path: String,
    values: Map<String, Value>,
}

impl ConfigSection {
    /// Wrap `values` under the section `path` (e.g. `probes.web`).
    pub fn new(path: impl Into<String>, values: Map<String, Value>) -> Self {
        Self {
            path: path.into(),
            values,
        }
    }

    /// Build a section from any JSON value; non-objects are rejected.
    pub fn from_value(path: impl Into<String>, value: Value) -> Result<Self, ProbeError> {
        let path = path.into();
        match value {
            Value::Object(values) => Ok(Self { path, values }),
            Value::Null => Ok(Self {
                path,
                values: Map::new(),
            }),
            other => Err(ProbeError::invalid_config(
                path,
                format!("expected an object, found {}", json_type_name(&other)),
            )),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Dotted path of `key` within this section, used in error messages.
    pub fn field_path(&self, key: &str) -> String {
        field_path(&self.path, key)
    }

    /// Required string field.
    pub fn str(&self, key: &str) -> Result<&str, ProbeError> {
        self.opt_str(key)?
            .ok_or_else(|| ProbeError::invalid_config(self.field_path(key), "missing required field"))
    }

    /// Optional string field. An explicit `null` counts as absent.
    pub fn opt_str(&self, key: &str) -> Result<Option<&str>, ProbeError> {
        match self.values.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(self.type_error(key, "a string", other)),
        }
    }

    /// Optional non-negative integer field.
    pub fn opt_u64(&self, key: &str) -> Result<Option<u64>, ProbeError> {
        match self.values.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value @ Value::Number(n)) => n
                .as_u64()
                .map(Some)
                .ok_or_else(|| self.type_error(key, "a non-negative integer", value)),
            Some(other) => Err(self.type_error(key, "a non-negative integer", other)),
        }
    }

    fn type_error(&self, key: &str, expected: &str, found: &Value) -> ProbeError {
        ProbeError::invalid_config(
            self.field_path(key),
            format!("expected {expected}, found {}", json_type_name(found)),
        )
    }
}

/// Join a section path and a key into the dotted form used by
/// [`ProbeError::InvalidConfig`].
pub fn field_path(section: &str, key: &str) -> String {
    if section.is_empty() {
        key.to_string()
    } else {
        format!("{section}.{key}")
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
