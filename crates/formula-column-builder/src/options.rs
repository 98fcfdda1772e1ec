#![forbid(unsafe_code)]

use crate::error::{BuilderError, BuilderResult};
use serde::{Deserialize, Serialize};

/// Number of history entries returned by `recent_history`.
pub const DEFAULT_HISTORY_READ: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderOptions {
    /// Number of independently appendable segments. Fixed for the builder's lifetime.
    pub segment_count: usize,
    /// Number of recently accepted values (or rows) kept for `read_history`.
    pub history_capacity: usize,
    /// Bulk appends are staged and forwarded in blocks of this many values.
    pub block_size: usize,
}

impl Default for BuilderOptions {
    fn default() -> Self {
        Self {
            segment_count: 1,
            history_capacity: 10,
            block_size: 1024,
        }
    }
}

impl BuilderOptions {
    pub fn new(segment_count: usize, history_capacity: usize) -> Self {
        Self {
            segment_count,
            history_capacity,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> BuilderResult<()> {
        if self.segment_count == 0 {
            return Err(BuilderError::InvalidOptions(
                "segment_count must be at least 1".to_string(),
            ));
        }
        if self.block_size == 0 {
            return Err(BuilderError::InvalidOptions(
                "block_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
