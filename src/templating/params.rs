//! Parameter values for placeholder substitution.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::core::RegistryError;

/// Parameter bindings in insertion order.
///
/// Insertion order fixes the order in which keys are applied, which keeps
/// substitution reproducible.
pub type Params = IndexMap<String, ParamValue>;

/// A single parameter value.
///
/// Only [`ParamValue::Text`] is quoted when substituted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl ParamValue {
    /// Text form inserted into SQL.
    #[must_use]
    pub fn to_sql_literal(&self) -> String {
        if self.is_text() {
            format!("'{self}'")
        } else {
            self.to_string()
        }
    }

    #[must_use]
    pub const fn is_text(&self) -> bool {
        matches!(self, ParamValue::Text(_))
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Null => f.write_str("NULL"),
            ParamValue::Bool(value) => write!(f, "{value}"),
            ParamValue::Integer(value) => write!(f, "{value}"),
            ParamValue::Float(value) => write!(f, "{value}"),
            ParamValue::Text(value) => f.write_str(value),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Integer(i64::from(value))
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Integer(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl TryFrom<Value> for ParamValue {
    type Error = RegistryError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Null => Ok(ParamValue::Null),
            Value::Bool(b) => Ok(ParamValue::Bool(b)),
            Value::String(s) => Ok(ParamValue::Text(s)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(ParamValue::Integer(i)),
                None => n.as_f64().map(ParamValue::Float).ok_or_else(|| RegistryError::Other {
                    message: format!("Unsupported numeric parameter value: {n}"),
                }),
            },
            other => Err(RegistryError::Other {
                message: format!("Parameter values must be scalars, got {other}"),
            }),
        }
    }
}

/// Build [`Params`] from a JSON object.
///
/// Keys are inserted in `serde_json`'s map order (sorted unless the
/// `preserve_order` feature is enabled).
///
/// # Errors
///
/// Fails if `value` is not an object or contains a non-scalar value.
pub fn params_from_json(value: Value) -> Result<Params, RegistryError> {
    let Value::Object(map) = value else {
        return Err(RegistryError::Other {
            message: "Parameters must be a JSON object".to_string(),
        });
    };

    map.into_iter()
        .map(|(key, value)| ParamValue::try_from(value).map(|value| (key, value)))
        .collect()
}
