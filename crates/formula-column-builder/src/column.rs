#![forbid(unsafe_code)]

use crate::builder::{AppendReport, BuilderCore};
use crate::error::BuilderResult;
use crate::finalize::finalize_column;
use crate::options::{BuilderOptions, DEFAULT_HISTORY_READ};
use crate::sink::ColumnSink;
use crate::stats::BuilderStats;
use crate::types::{Value, ValueType};

/// Builds one immutable column by appending values over time.
///
/// Without a declared type the element type is inferred from the values and widened as needed
/// (`Integer` to `Float`, `NumericVector` to `HeterogeneousList`). A declared type is fixed: values
/// must fit it as-is.
///
/// All methods take `&self`, so one thread per segment can append concurrently:
///
/// ```
/// use formula_column_builder::{BuilderOptions, ColumnBuilder, MemorySink, Value};
///
/// let builder = ColumnBuilder::new(BuilderOptions::new(2, 10), None).unwrap();
/// std::thread::scope(|s| {
///     s.spawn(|| builder.append_multiple((10..20i64).map(Value::from), 1).unwrap());
///     s.spawn(|| builder.append_multiple((0..10i64).map(Value::from), 0).unwrap());
/// });
/// let column = builder.close(&mut MemorySink).unwrap();
/// assert_eq!(column.get(0), Some(&Value::Integer(0)));
/// assert_eq!(column.len(), 20);
/// ```
#[derive(Debug)]
pub struct ColumnBuilder {
    core: BuilderCore,
}

impl ColumnBuilder {
    pub fn new(options: BuilderOptions, declared: Option<ValueType>) -> BuilderResult<Self> {
        Ok(Self {
            core: BuilderCore::new(&options, declared)?,
        })
    }

    /// Append one value to `segment`.
    ///
    /// Fails with `TypeMismatch` if the value cannot join the column; the value is dropped and the
    /// builder stays usable.
    pub fn append(&self, value: impl Into<Value>, segment: usize) -> BuilderResult<()> {
        self.core.append(value.into(), segment)
    }

    /// Append a (possibly lazy) sequence of values to `segment`.
    ///
    /// Values that do not fit are skipped and listed in the returned report; the rest are stored
    /// in input order.
    pub fn append_multiple<I>(&self, values: I, segment: usize) -> BuilderResult<AppendReport>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.core
            .append_multiple(values.into_iter().map(Into::into), segment)
    }

    pub fn get_type(&self) -> BuilderResult<ValueType> {
        self.core.get_type()
    }

    /// The last `n` accepted values, oldest first.
    pub fn read_history(&self, n: usize) -> BuilderResult<Vec<Value>> {
        self.core.read_history(n)
    }

    pub fn recent_history(&self) -> BuilderResult<Vec<Value>> {
        self.read_history(DEFAULT_HISTORY_READ)
    }

    /// Finalize the column into `sink`. Any later call on this builder fails with `AlreadyClosed`.
    pub fn close<S: ColumnSink>(&self, sink: &mut S) -> BuilderResult<S::Column> {
        finalize_column(self.core.close()?, sink)
    }

    pub fn len(&self) -> usize {
        self.core.stats().accepted as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn segment_count(&self) -> usize {
        self.core.segment_count()
    }

    pub fn segment_lengths(&self) -> Vec<usize> {
        self.core.segment_lengths()
    }

    pub fn is_closed(&self) -> bool {
        self.core.is_closed()
    }

    pub fn stats(&self) -> BuilderStats {
        self.core.stats()
    }
}
