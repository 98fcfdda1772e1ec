#![forbid(unsafe_code)]

use chrono::{FixedOffset, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Element type of a column under construction.
///
/// `Unknown` is the state of a builder that has not accepted anything yet. `Missing` is the type of
/// a column that has only seen missing values so far; it is promotable to any other type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    #[default]
    Unknown,
    Integer,
    Float,
    String,
    DateTime,
    NumericVector,
    HeterogeneousList,
    Dictionary,
    Missing,
}

impl ValueType {
    pub fn name(self) -> &'static str {
        match self {
            ValueType::Unknown => "unknown",
            ValueType::Integer => "integer",
            ValueType::Float => "float",
            ValueType::String => "string",
            ValueType::DateTime => "datetime",
            ValueType::NumericVector => "numeric vector",
            ValueType::HeterogeneousList => "list",
            ValueType::Dictionary => "dictionary",
            ValueType::Missing => "missing",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A raw value handed to a builder.
///
/// Values are stored exactly as appended and only widened to the column's final type when the
/// builder is closed.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Missing,
    Integer(i64),
    Float(f64),
    String(Arc<str>),
    /// A timestamp, optionally carrying the UTC offset it was recorded in.
    DateTime {
        at: NaiveDateTime,
        offset: Option<FixedOffset>,
    },
    /// Homogeneous vector of floats.
    Vector(Vec<f64>),
    List(Vec<Value>),
    /// Insertion-ordered mapping; keys may be any value.
    Dict(Vec<(Value, Value)>),
}

impl Value {
    pub fn string(s: impl AsRef<str>) -> Self {
        Value::String(Arc::<str>::from(s.as_ref()))
    }

    pub fn datetime(at: NaiveDateTime) -> Self {
        Value::DateTime { at, offset: None }
    }

    pub fn datetime_with_offset(at: NaiveDateTime, offset: FixedOffset) -> Self {
        Value::DateTime {
            at,
            offset: Some(offset),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Returns the value as a float if it is an integer or a float.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value as i64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::string(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(Arc::<str>::from(value))
    }
}

impl From<Vec<f64>> for Value {
    fn from(value: Vec<f64>) -> Self {
        Value::Vector(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Missing)
    }
}
