//! Typed access to bound tool arguments.

use serde_json::{Map, Value};

use crate::error::ArcheError;

/// Arguments after binding and validation against a tool's descriptor.
///
/// Always a JSON object keyed by declared parameter names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolArguments {
    values: Map<String, Value>,
}

impl ToolArguments {
    pub fn new(values: Map<String, Value>) -> Self {
        Self { values }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Bound arguments as a JSON object.
    pub fn to_value(&self) -> Value {
        Value::Object(self.values.clone())
    }

    pub fn get_str(&self, key: &str) -> Result<&str, ArcheError> {
        self.values
            .get(key)
            .and_then(Value::as_str)
            .ok_or_else(|| ArcheError::InvalidArgument(format!("Missing string argument: {key}")))
    }

    pub fn get_str_opt(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    pub fn get_i64(&self, key: &str) -> Result<i64, ArcheError> {
        self.values
            .get(key)
            .and_then(Value::as_i64)
            .ok_or_else(|| ArcheError::InvalidArgument(format!("Missing integer argument: {key}")))
    }

    pub fn get_f64(&self, key: &str) -> Result<f64, ArcheError> {
        self.values
            .get(key)
            .and_then(Value::as_f64)
            .ok_or_else(|| ArcheError::InvalidArgument(format!("Missing number argument: {key}")))
    }

    pub fn get_bool(&self, key: &str) -> Result<bool, ArcheError> {
        self.values
            .get(key)
            .and_then(Value::as_bool)
            .ok_or_else(|| ArcheError::InvalidArgument(format!("Missing boolean argument: {key}")))
    }

    pub fn get_array(&self, key: &str) -> Result<&Vec<Value>, ArcheError> {
        self.values
            .get(key)
            .and_then(Value::as_array)
            .ok_or_else(|| ArcheError::InvalidArgument(format!("Missing array argument: {key}")))
    }

    /// Deserialize all arguments into a typed struct.
    pub fn deserialize<T: serde::de::DeserializeOwned>(&self) -> Result<T, ArcheError> {
        serde_json::from_value(self.to_value()).map_err(|e| {
            ArcheError::InvalidArgument(format!("Failed to deserialize arguments: {e}"))
        })
    }
}

impl From<Map<String, Value>> for ToolArguments {
    fn from(values: Map<String, Value>) -> Self {
        Self::new(values)
    }
}
