//! Incremental, type-inferring builders for immutable columns and tables.
//!
//! This crate focuses on:
//! - Type inference while appending (a narrow, lossless promotion lattice).
//! - Segmented staging so independent workers can fill one builder concurrently.
//! - Deterministic finalization: segments are concatenated by index, values widened to the final
//!   type, and the result handed to a [`ColumnSink`] / [`TableSink`].
//! - A bounded history of recently accepted values for inspection during the build.

#![forbid(unsafe_code)]

mod builder;
mod column;
mod error;
mod finalize;
mod history;
pub mod lattice;
mod options;
mod segment;
mod sink;
mod stats;
mod table;
mod types;

pub use crate::builder::{AppendReport, Rejection};
pub use crate::column::ColumnBuilder;
pub use crate::error::{BuilderError, BuilderResult, SinkError};
pub use crate::options::{BuilderOptions, DEFAULT_HISTORY_READ};
pub use crate::sink::{Column, ColumnSink, MemorySink, StagedColumn, Table, TableSink};
pub use crate::stats::BuilderStats;
pub use crate::table::{ColumnSchema, TableBuilder};
pub use crate::types::{Value, ValueType};
