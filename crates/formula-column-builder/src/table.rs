#![forbid(unsafe_code)]

use crate::builder::{lock, AppendReport, BuilderCore, Rejection};
use crate::error::{BuilderError, BuilderResult};
use crate::finalize::finalize_table;
use crate::options::{BuilderOptions, DEFAULT_HISTORY_READ};
use crate::sink::TableSink;
use crate::stats::BuilderStats;
use crate::types::{Value, ValueType};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    pub column_type: ValueType,
}

#[derive(Debug, Default)]
struct TableState {
    closed: bool,
    stats: BuilderStats,
}

/// Builds an immutable table with a fixed schema, one row at a time.
///
/// Each column is staged by its own builder core. A row append validates every field before any is
/// stored, so columns never drift out of alignment. Row appends are serialized by a table-level
/// gate; this also keeps every column's history row-aligned.
#[derive(Debug)]
pub struct TableBuilder {
    schema: Vec<ColumnSchema>,
    columns: Vec<BuilderCore>,
    gate: Mutex<TableState>,
    segment_count: usize,
    block_size: usize,
}

fn generate_column_names(count: usize) -> Vec<String> {
    (1..=count).map(|i| format!("X{i}")).collect()
}

impl TableBuilder {
    /// Create a builder for columns of `column_types`.
    ///
    /// Column names default to `X1..Xk`. Declaring a column as [`ValueType::Unknown`] or
    /// [`ValueType::Missing`] lets its type be inferred from the data.
    pub fn new(
        column_types: Vec<ValueType>,
        column_names: Option<Vec<String>>,
        options: BuilderOptions,
    ) -> BuilderResult<Self> {
        if column_types.is_empty() {
            return Err(BuilderError::Schema(
                "column types must be defined".to_string(),
            ));
        }
        let names = match column_names {
            Some(names) if names.len() != column_types.len() => {
                return Err(BuilderError::Schema(format!(
                    "got {} column names for {} column types",
                    names.len(),
                    column_types.len()
                )));
            }
            Some(names) => names,
            None => generate_column_names(column_types.len()),
        };

        let schema = names
            .into_iter()
            .zip(column_types)
            .map(|(name, column_type)| ColumnSchema { name, column_type })
            .collect();
        Self::from_schema(schema, options)
    }

    pub fn from_schema(schema: Vec<ColumnSchema>, options: BuilderOptions) -> BuilderResult<Self> {
        if schema.is_empty() {
            return Err(BuilderError::Schema(
                "column types must be defined".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = schema.iter().find(|col| !seen.insert(col.name.as_str())) {
            return Err(BuilderError::Schema(format!(
                "duplicate column name {}",
                dup.name
            )));
        }

        let columns = schema
            .iter()
            .map(|col| BuilderCore::new(&options, Some(col.column_type)))
            .collect::<BuilderResult<Vec<_>>>()?;

        Ok(Self {
            schema,
            columns,
            gate: Mutex::new(TableState::default()),
            segment_count: options.segment_count,
            block_size: options.block_size,
        })
    }

    pub fn schema(&self) -> &[ColumnSchema] {
        &self.schema
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.schema.iter().map(|col| col.name.as_str()).collect()
    }

    fn open_gate(&self) -> BuilderResult<MutexGuard<'_, TableState>> {
        let state = lock(&self.gate);
        if state.closed {
            return Err(BuilderError::AlreadyClosed);
        }
        Ok(state)
    }

    fn check_segment(&self, segment: usize) -> BuilderResult<()> {
        if segment >= self.segment_count {
            return Err(BuilderError::InvalidSegment {
                segment,
                segment_count: self.segment_count,
            });
        }
        Ok(())
    }

    fn validate_row(&self, row: &[Value]) -> BuilderResult<()> {
        if row.len() != self.columns.len() {
            return Err(BuilderError::RowArityMismatch {
                expected: self.columns.len(),
                actual: row.len(),
            });
        }
        for ((core, col), value) in self.columns.iter().zip(&self.schema).zip(row) {
            core.check(value).map_err(|err| err.in_column(&col.name))?;
        }
        Ok(())
    }

    /// Stores a row that already passed `validate_row` under the same gate.
    fn commit_row(&self, row: Vec<Value>, segment: usize) -> BuilderResult<()> {
        for ((core, col), value) in self.columns.iter().zip(&self.schema).zip(row) {
            core.append(value, segment)
                .map_err(|err| err.in_column(&col.name))?;
        }
        Ok(())
    }

    /// Append one row to `segment`. Fails without storing anything if the row has the wrong
    /// number of fields or any field does not fit its column.
    pub fn append<R>(&self, row: R, segment: usize) -> BuilderResult<()>
    where
        R: IntoIterator,
        R::Item: Into<Value>,
    {
        let row: Vec<Value> = row.into_iter().map(Into::into).collect();
        let mut state = self.open_gate()?;
        self.check_segment(segment)?;

        if let Err(err) = self.validate_row(&row) {
            state.stats.rejected += 1;
            return Err(err);
        }
        self.commit_row(row, segment)?;
        state.stats.accepted += 1;
        Ok(())
    }

    /// Append a single value as a one-field row, for single-column tables.
    ///
    /// Tables with more than one column reject it with `RowArityMismatch`.
    pub fn append_value(&self, value: impl Into<Value>, segment: usize) -> BuilderResult<()> {
        self.append([value.into()], segment)
    }

    /// Append a (possibly lazy) sequence of rows to `segment`.
    ///
    /// Rows that fail arity or type validation are skipped and reported individually.
    pub fn append_multiple<I, R>(
        &self,
        rows: I,
        segment: usize,
    ) -> BuilderResult<AppendReport<Vec<Value>>>
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator,
        R::Item: Into<Value>,
    {
        drop(self.open_gate()?);
        self.check_segment(segment)?;

        let mut report = AppendReport::default();
        let mut position = 0usize;
        let mut rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect::<Vec<Value>>());
        let mut block: Vec<Vec<Value>> = Vec::with_capacity(self.block_size);

        loop {
            block.extend(rows.by_ref().take(self.block_size));
            if block.is_empty() {
                break;
            }

            let mut state = self.open_gate()?;
            for row in block.drain(..) {
                match self.validate_row(&row) {
                    Ok(()) => {
                        self.commit_row(row, segment)?;
                        state.stats.accepted += 1;
                        report.accepted += 1;
                    }
                    Err(error) => {
                        state.stats.rejected += 1;
                        report.rejections.push(Rejection {
                            position,
                            value: row,
                            error,
                        });
                    }
                }
                position += 1;
            }
        }

        if !report.is_clean() {
            log::warn!(
                "skipped {} of {} rows appended to segment {segment}",
                report.rejected(),
                position
            );
        }
        Ok(report)
    }

    /// Current element type of every column, in schema order.
    pub fn get_type(&self) -> BuilderResult<Vec<ValueType>> {
        let _state = self.open_gate()?;
        self.columns.iter().map(BuilderCore::get_type).collect()
    }

    /// The last `n` accepted rows, oldest first.
    pub fn read_history(&self, n: usize) -> BuilderResult<Vec<Vec<Value>>> {
        let _state = self.open_gate()?;
        let mut columns = self
            .columns
            .iter()
            .map(|core| core.read_history(n).map(Vec::into_iter))
            .collect::<BuilderResult<Vec<_>>>()?;

        let rows = columns.first().map(|c| c.len()).unwrap_or(0);
        Ok((0..rows)
            .map(|_| columns.iter_mut().filter_map(Iterator::next).collect())
            .collect())
    }

    pub fn recent_history(&self) -> BuilderResult<Vec<Vec<Value>>> {
        self.read_history(DEFAULT_HISTORY_READ)
    }

    /// Finalize every column and hand the table to `sink`. Any later call fails with
    /// `AlreadyClosed`.
    pub fn close<S: TableSink>(&self, sink: &mut S) -> BuilderResult<S::Table> {
        let staged = {
            let mut state = self.open_gate()?;
            state.closed = true;
            log::debug!(
                "closing table with {} columns and {} rows",
                self.columns.len(),
                state.stats.accepted
            );
            self.schema
                .iter()
                .zip(&self.columns)
                .map(|(col, core)| core.close().map(|staged| (col.name.clone(), staged)))
                .collect::<BuilderResult<Vec<_>>>()?
        };
        finalize_table(staged, sink)
    }

    pub fn len(&self) -> usize {
        lock(&self.gate).stats.accepted as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn segment_count(&self) -> usize {
        self.segment_count
    }

    /// Rows stored per segment.
    pub fn segment_lengths(&self) -> Vec<usize> {
        let _state = lock(&self.gate);
        self.columns
            .first()
            .map(BuilderCore::segment_lengths)
            .unwrap_or_default()
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.gate).closed
    }

    /// Row counters for the table, plus missing-value and promotion counts summed over columns.
    pub fn stats(&self) -> BuilderStats {
        let state = lock(&self.gate);
        let column_stats: Vec<BuilderStats> = self.columns.iter().map(BuilderCore::stats).collect();
        BuilderStats::for_rows(state.stats.accepted, state.stats.rejected, &column_stats)
    }
}
