#![forbid(unsafe_code)]

//! Destinations for finalized builders.
//!
//! A builder never owns its storage engine. On close it hands the ordered, already-widened values
//! to a sink and returns whatever handle the sink produces. [`MemorySink`] is the in-process
//! implementation used when the values should simply stay in memory.

use crate::error::SinkError;
use crate::types::{Value, ValueType};
use std::sync::Arc;

/// One finalized column on its way to a [`TableSink`].
#[derive(Clone, Debug, PartialEq)]
pub struct StagedColumn {
    pub name: String,
    pub element_type: ValueType,
    pub values: Vec<Value>,
}

pub trait ColumnSink {
    type Column;

    /// Materialize `values` as an immutable column of `element_type`, preserving order.
    fn materialize(
        &mut self,
        element_type: ValueType,
        values: Vec<Value>,
    ) -> Result<Self::Column, SinkError>;
}

pub trait TableSink {
    type Table;

    /// Materialize equally sized named columns as an immutable table, preserving column order.
    fn materialize(&mut self, columns: Vec<StagedColumn>) -> Result<Self::Table, SinkError>;
}

/// Immutable column handle produced by [`MemorySink`].
#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    element_type: ValueType,
    values: Arc<[Value]>,
}

impl Column {
    pub fn element_type(&self) -> ValueType {
        self.element_type
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, row: usize) -> Option<&Value> {
        self.values.get(row)
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.values.iter()
    }
}

/// Immutable table handle produced by [`MemorySink`].
#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    names: Vec<String>,
    columns: Vec<Column>,
    rows: usize,
}

impl Table {
    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        let idx = self.names.iter().position(|n| n == name)?;
        self.columns.get(idx)
    }

    pub fn column_at(&self, idx: usize) -> Option<&Column> {
        self.columns.get(idx)
    }

    pub fn column_types(&self) -> Vec<ValueType> {
        self.columns.iter().map(Column::element_type).collect()
    }

    pub fn get_cell(&self, row: usize, col: usize) -> Option<&Value> {
        self.columns.get(col)?.get(row)
    }

    pub fn row(&self, row: usize) -> Option<Vec<Value>> {
        if row >= self.rows {
            return None;
        }
        self.columns
            .iter()
            .map(|column| column.get(row).cloned())
            .collect()
    }
}

/// Keeps finalized columns and tables in memory.
#[derive(Clone, Copy, Debug, Default)]
pub struct MemorySink;

impl ColumnSink for MemorySink {
    type Column = Column;

    fn materialize(
        &mut self,
        element_type: ValueType,
        values: Vec<Value>,
    ) -> Result<Column, SinkError> {
        Ok(Column {
            element_type,
            values: values.into(),
        })
    }
}

impl TableSink for MemorySink {
    type Table = Table;

    fn materialize(&mut self, columns: Vec<StagedColumn>) -> Result<Table, SinkError> {
        let rows = columns.first().map(|c| c.values.len()).unwrap_or(0);
        if let Some(bad) = columns.iter().find(|c| c.values.len() != rows) {
            return Err(SinkError::new(format!(
                "column {} has {} values, expected {rows}",
                bad.name,
                bad.values.len()
            )));
        }

        let mut names = Vec::with_capacity(columns.len());
        let mut materialized = Vec::with_capacity(columns.len());
        for column in columns {
            names.push(column.name);
            materialized.push(ColumnSink::materialize(
                self,
                column.element_type,
                column.values,
            )?);
        }

        Ok(Table {
            names,
            columns: materialized,
            rows,
        })
    }
}
