#![forbid(unsafe_code)]

use std::collections::VecDeque;

/// Fixed-capacity window over the most recently accepted values.
///
/// Once full, each push evicts the oldest entry. Reads are always oldest-first.
#[derive(Clone, Debug)]
pub(crate) struct HistoryRing<T> {
    capacity: usize,
    entries: VecDeque<T>,
}

impl<T: Clone> HistoryRing<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, value: T) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(value);
    }

    /// The last `min(n, len)` entries in chronological order.
    pub fn read(&self, n: usize) -> Vec<T> {
        let take = n.min(self.entries.len());
        let skip = self.entries.len() - take;
        self.entries.iter().skip(skip).cloned().collect()
    }
}
