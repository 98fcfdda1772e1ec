#![forbid(unsafe_code)]

use crate::types::Value;

/// Append-only staging area for one segment.
///
/// Values are kept raw (not yet widened to the column type) and grouped into blocks of
/// `block_size`. The open block is sealed into `blocks` once it fills up; block boundaries are
/// invisible to readers.
#[derive(Debug)]
pub(crate) struct SegmentBuffer {
    index: usize,
    block_size: usize,
    current: Vec<Value>,
    blocks: Vec<Vec<Value>>,
    len: usize,
}

impl SegmentBuffer {
    pub fn new(index: usize, block_size: usize) -> Self {
        debug_assert!(block_size > 0);
        Self {
            index,
            block_size,
            current: Vec::new(),
            blocks: Vec::new(),
            len: 0,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn append(&mut self, value: Value) {
        if self.current.capacity() == 0 {
            self.current.reserve_exact(self.block_size);
        }
        self.current.push(value);
        self.len += 1;
        if self.current.len() == self.block_size {
            self.seal();
        }
    }

    pub fn append_batch(&mut self, values: impl IntoIterator<Item = Value>) {
        let mut values = values.into_iter().peekable();
        while values.peek().is_some() {
            let room = self.block_size - self.current.len();
            if self.current.capacity() == 0 {
                self.current.reserve_exact(self.block_size);
            }
            let before = self.current.len();
            self.current.extend(values.by_ref().take(room));
            self.len += self.current.len() - before;
            if self.current.len() == self.block_size {
                self.seal();
            }
        }
    }

    fn seal(&mut self) {
        let block = std::mem::take(&mut self.current);
        self.blocks.push(block);
    }

    /// Consume the buffer, yielding values in append order.
    pub fn into_values(mut self) -> impl Iterator<Item = Value> {
        if !self.current.is_empty() {
            self.seal();
        }
        self.blocks.into_iter().flatten()
    }

    /// Move the staged values out, leaving an empty buffer with the same index.
    pub fn take(&mut self) -> SegmentBuffer {
        let empty = SegmentBuffer::new(self.index, self.block_size);
        std::mem::replace(self, empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(range: std::ops::Range<i64>) -> Vec<Value> {
        range.map(Value::Integer).collect()
    }

    #[test]
    fn batch_and_single_appends_preserve_order_across_blocks() {
        let mut segment = SegmentBuffer::new(0, 4);
        segment.append(Value::Integer(0));
        segment.append_batch(ints(1..9));
        segment.append(Value::Integer(9));
        segment.append_batch(Vec::new());

        assert_eq!(segment.len(), 10);
        assert_eq!(segment.blocks.len(), 2);
        assert_eq!(segment.into_values().collect::<Vec<_>>(), ints(0..10));
    }

    #[test]
    fn take_leaves_empty_buffer() {
        let mut segment = SegmentBuffer::new(3, 2);
        segment.append_batch(ints(0..3));
        let taken = segment.take();
        assert_eq!(taken.index(), 3);
        assert_eq!(taken.len(), 3);
        assert_eq!(segment.len(), 0);
        assert_eq!(segment.index(), 3);
    }
}
