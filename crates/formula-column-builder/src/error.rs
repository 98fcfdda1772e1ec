#![forbid(unsafe_code)]

use crate::types::ValueType;
use thiserror::Error;

/// Errors raised by column and table builders.
///
/// Every variant is reported at the offending call. None of them corrupt values that were
/// already accepted, and apart from [`BuilderError::Schema`] and [`BuilderError::InvalidOptions`]
/// the builder stays usable afterwards.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuilderError {
    #[error("segment {segment} out of range (builder has {segment_count} segments)")]
    InvalidSegment { segment: usize, segment_count: usize },

    #[error(
        "type mismatch{}: cannot append {incoming} value to {current} column",
        column_suffix(.column.as_deref())
    )]
    TypeMismatch {
        column: Option<String>,
        current: ValueType,
        incoming: ValueType,
    },

    #[error("row has {actual} fields, expected {expected}")]
    RowArityMismatch { expected: usize, actual: usize },

    #[error("schema error: {0}")]
    Schema(String),

    #[error("invalid builder options: {0}")]
    InvalidOptions(String),

    #[error("builder is already closed")]
    AlreadyClosed,

    #[error(transparent)]
    Sink(#[from] SinkError),
}

impl BuilderError {
    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, BuilderError::TypeMismatch { .. })
    }

    pub(crate) fn in_column(self, name: &str) -> Self {
        match self {
            BuilderError::TypeMismatch {
                column: None,
                current,
                incoming,
            } => BuilderError::TypeMismatch {
                column: Some(name.to_string()),
                current,
                incoming,
            },
            other => other,
        }
    }
}

fn column_suffix(column: Option<&str>) -> String {
    match column {
        Some(name) => format!(" in column {name}"),
        None => String::new(),
    }
}

/// Failure reported by a [`crate::ColumnSink`] or [`crate::TableSink`] while materializing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("sink failed to materialize: {message}")]
pub struct SinkError {
    pub message: String,
}

impl SinkError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub type BuilderResult<T> = std::result::Result<T, BuilderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_mismatch_message_names_column() {
        let err = BuilderError::TypeMismatch {
            column: None,
            current: ValueType::Integer,
            incoming: ValueType::String,
        }
        .in_column("X2");
        assert_eq!(
            err.to_string(),
            "type mismatch in column X2: cannot append string value to integer column"
        );
    }
}
