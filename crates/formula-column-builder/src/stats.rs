#![forbid(unsafe_code)]

/// Counters describing what a builder has accepted so far.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BuilderStats {
    /// Values (or rows, for tables) stored across all segments.
    pub accepted: u64,
    /// Values (or rows) rejected with a type or arity error.
    pub rejected: u64,
    /// Accepted values that were missing.
    pub missing_count: u64,
    /// Number of times the aggregate type changed.
    pub promotions: u64,
}

impl BuilderStats {
    /// Table counters: row totals from the table itself, missing values and promotions summed
    /// over its columns.
    pub(crate) fn for_rows<'a>(
        accepted: u64,
        rejected: u64,
        columns: impl IntoIterator<Item = &'a BuilderStats>,
    ) -> Self {
        columns.into_iter().fold(
            BuilderStats {
                accepted,
                rejected,
                ..BuilderStats::default()
            },
            |mut acc, col| {
                acc.missing_count += col.missing_count;
                acc.promotions += col.promotions;
                acc
            },
        )
    }
}
