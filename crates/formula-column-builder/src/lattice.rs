#![forbid(unsafe_code)]

//! Type inference and promotion rules.
//!
//! The lattice is deliberately narrow. The only widening edges are:
//! - `Integer -> Float`
//! - `NumericVector -> HeterogeneousList`
//! - `Missing -> anything`
//!
//! Every accepted promotion is lossless, so values staged before a promotion can always be
//! widened to the final type when the column is finalized.

use crate::types::{Value, ValueType};

/// Two types with no promotion path in either direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Incompatible {
    pub current: ValueType,
    pub incoming: ValueType,
}

/// The natural type of a raw value.
pub fn classify(value: &Value) -> ValueType {
    match value {
        Value::Missing => ValueType::Missing,
        Value::Integer(_) => ValueType::Integer,
        Value::Float(_) => ValueType::Float,
        Value::String(_) => ValueType::String,
        Value::DateTime { .. } => ValueType::DateTime,
        Value::Vector(_) => ValueType::NumericVector,
        Value::List(_) => ValueType::HeterogeneousList,
        Value::Dict(_) => ValueType::Dictionary,
    }
}

fn is_edge(from: ValueType, to: ValueType) -> bool {
    matches!(
        (from, to),
        (ValueType::Integer, ValueType::Float)
            | (ValueType::NumericVector, ValueType::HeterogeneousList)
            | (ValueType::Missing, _)
    )
}

/// Least upper bound of `current` and `incoming`.
pub fn promote(current: ValueType, incoming: ValueType) -> Result<ValueType, Incompatible> {
    if current == ValueType::Unknown {
        return Ok(incoming);
    }
    if matches!(incoming, ValueType::Missing | ValueType::Unknown) || current == incoming {
        return Ok(current);
    }
    if is_edge(current, incoming) {
        return Ok(incoming);
    }
    if is_edge(incoming, current) {
        return Ok(current);
    }
    Err(Incompatible { current, incoming })
}

fn is_numeric_list(items: &[Value]) -> bool {
    items
        .iter()
        .all(|item| matches!(item, Value::Integer(_) | Value::Float(_)))
}

/// Decide whether `value` can join a column whose aggregate type is `current`.
///
/// Returns the aggregate type after accepting the value. When `pinned` is set the aggregate must
/// not change: the value has to fit the current type as-is (e.g. an integer into a float column).
pub fn admit(current: ValueType, pinned: bool, value: &Value) -> Result<ValueType, Incompatible> {
    let incoming = classify(value);

    // A list of plain numbers fits a vector column without widening it.
    if current == ValueType::NumericVector {
        if let Value::List(items) = value {
            if is_numeric_list(items) {
                return Ok(current);
            }
        }
    }

    let promoted = promote(current, incoming)?;
    if pinned && promoted != current {
        return Err(Incompatible { current, incoming });
    }
    Ok(promoted)
}

/// The form in which an admitted value is stored.
///
/// A list of plain numbers admitted into a vector column is stored as a float vector, so it widens
/// like any other vector if the column later becomes a list column.
pub fn settle(value: Value, aggregate: ValueType) -> Value {
    match value {
        Value::List(items) if aggregate == ValueType::NumericVector && is_numeric_list(&items) => {
            Value::Vector(items.iter().filter_map(Value::as_f64).collect())
        }
        value => value,
    }
}

/// Widen a staged value to the column's final type.
///
/// Only pairs accepted by [`admit`] reach this function, so the conversion cannot fail. Values that
/// already have the target type (and missing values) pass through unchanged.
pub fn coerce(value: Value, target: ValueType) -> Value {
    match (value, target) {
        (Value::Integer(v), ValueType::Float) => Value::Float(v as f64),
        (Value::Vector(v), ValueType::HeterogeneousList) => {
            Value::List(v.into_iter().map(Value::Float).collect())
        }
        (value, target) => {
            debug_assert!(
                value.is_missing() || classify(&value) == target,
                "coercing {:?} value to {target} was never admitted",
                classify(&value)
            );
            value
        }
    }
}
