#![forbid(unsafe_code)]

//! Turning staged segments into the final column.
//!
//! Values were validated against the aggregate type when they were appended and stored raw. Here
//! they are concatenated by segment index and widened to the final type. The widening only follows
//! edges that validation already accepted, so finalization cannot fail on type grounds.

use crate::error::BuilderResult;
use crate::lattice;
use crate::segment::SegmentBuffer;
use crate::sink::{ColumnSink, StagedColumn, TableSink};
use crate::types::{Value, ValueType};

#[derive(Debug)]
pub(crate) struct StagedSegments {
    pub element_type: ValueType,
    pub segments: Vec<SegmentBuffer>,
}

impl StagedSegments {
    pub fn into_values(self) -> Vec<Value> {
        let StagedSegments {
            element_type,
            mut segments,
        } = self;
        segments.sort_by_key(SegmentBuffer::index);

        let total = segments.iter().map(SegmentBuffer::len).sum();
        let mut values = Vec::with_capacity(total);
        for segment in segments {
            values.extend(
                segment
                    .into_values()
                    .map(|value| lattice::coerce(value, element_type)),
            );
        }
        values
    }
}

pub(crate) fn finalize_column<S: ColumnSink>(
    staged: StagedSegments,
    sink: &mut S,
) -> BuilderResult<S::Column> {
    let element_type = staged.element_type;
    let values = staged.into_values();
    Ok(sink.materialize(element_type, values)?)
}

pub(crate) fn finalize_table<S: TableSink>(
    columns: Vec<(String, StagedSegments)>,
    sink: &mut S,
) -> BuilderResult<S::Table> {
    let columns = columns
        .into_iter()
        .map(|(name, staged)| StagedColumn {
            name,
            element_type: staged.element_type,
            values: staged.into_values(),
        })
        .collect();
    Ok(sink.materialize(columns)?)
}
