//! Transaction records
//!
//! A record is a request-scoped mapping from feature name to raw value. Only
//! the keys named by the schema are consumed; everything else is ignored.

use std::collections::HashMap;

use serde_json::{Map, Value};

use super::pipeline::PreprocessingError;

/// Raw cell as it arrived on the wire
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Number(f64),
    Text(String),
    Missing,
    /// Boolean, array, object or unrepresentable number. Only an error if a
    /// schema column reads it.
    Unsupported(&'static str),
}

static MISSING: RawValue = RawValue::Missing;

impl RawValue {
    /// Convert a JSON value; `null` is missing
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => RawValue::Missing,
            Value::Number(n) => n
                .as_f64()
                .map(RawValue::Number)
                .unwrap_or(RawValue::Unsupported("out-of-range number")),
            Value::String(s) => RawValue::Text(s.clone()),
            Value::Bool(_) => RawValue::Unsupported("boolean"),
            Value::Array(_) => RawValue::Unsupported("array"),
            Value::Object(_) => RawValue::Unsupported("object"),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, RawValue::Missing)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

/// One transaction, immutable once built
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionRecord {
    values: HashMap<String, RawValue>,
}

impl TransactionRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, field: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.values.insert(field.into(), value.into());
        self
    }

    /// Build from a JSON object. Values are type-checked lazily, when a
    /// schema column reads them.
    pub fn from_json(object: &Map<String, Value>) -> Self {
        let values = object
            .iter()
            .map(|(field, value)| (field.clone(), RawValue::from_json(value)))
            .collect();
        Self { values }
    }

    /// Value for `field`; absent keys read as missing
    pub fn get(&self, field: &str) -> &RawValue {
        self.values.get(field).unwrap_or(&MISSING)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl TryFrom<&Value> for TransactionRecord {
    type Error = PreprocessingError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(object) => Ok(Self::from_json(object)),
            _ => Err(PreprocessingError::NotAnObject),
        }
    }
}
