#![forbid(unsafe_code)]

use crate::error::{BuilderError, BuilderResult};
use crate::finalize::StagedSegments;
use crate::history::HistoryRing;
use crate::lattice;
use crate::options::BuilderOptions;
use crate::segment::SegmentBuffer;
use crate::stats::BuilderStats;
use crate::types::{Value, ValueType};
use std::sync::{Mutex, MutexGuard};

/// A value skipped by a bulk append.
#[derive(Clone, Debug, PartialEq)]
pub struct Rejection<T = Value> {
    /// Zero-based position of the value in the input sequence.
    pub position: usize,
    pub value: T,
    pub error: BuilderError,
}

/// Outcome of a bulk append. Rejected values are listed individually, in input order.
#[derive(Clone, Debug, PartialEq)]
pub struct AppendReport<T = Value> {
    pub accepted: usize,
    pub rejections: Vec<Rejection<T>>,
}

impl<T> Default for AppendReport<T> {
    fn default() -> Self {
        Self {
            accepted: 0,
            rejections: Vec::new(),
        }
    }
}

impl<T> AppendReport<T> {
    pub fn rejected(&self) -> usize {
        self.rejections.len()
    }

    pub fn is_clean(&self) -> bool {
        self.rejections.is_empty()
    }
}

/// State shared by every segment of one builder.
///
/// Validation against the aggregate type and the commit of the new type plus the history entry
/// happen under a single lock acquisition, so concurrent segments cannot lose each other's
/// promotions.
#[derive(Debug)]
struct Shared {
    closed: bool,
    aggregate: ValueType,
    history: HistoryRing<Value>,
    stats: BuilderStats,
}

impl Shared {
    fn check(&self, pinned: bool, value: &Value) -> BuilderResult<ValueType> {
        lattice::admit(self.aggregate, pinned, value).map_err(|mismatch| {
            BuilderError::TypeMismatch {
                column: None,
                current: mismatch.current,
                incoming: mismatch.incoming,
            }
        })
    }

    /// Record an admitted value and return it in the form the segment should store.
    fn commit(&mut self, next: ValueType, value: Value) -> Value {
        if next != self.aggregate {
            log::trace!("column type promoted from {} to {next}", self.aggregate);
            self.aggregate = next;
            self.stats.promotions += 1;
        }
        if value.is_missing() {
            self.stats.missing_count += 1;
        }
        self.stats.accepted += 1;
        let value = lattice::settle(value, self.aggregate);
        self.history.push(value.clone());
        value
    }
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Segmented staging for one column.
///
/// Lock order is always segment, then shared state. `close` never holds the shared lock while
/// acquiring a segment lock.
#[derive(Debug)]
pub(crate) struct BuilderCore {
    pinned: bool,
    block_size: usize,
    shared: Mutex<Shared>,
    segments: Vec<Mutex<SegmentBuffer>>,
}

impl BuilderCore {
    /// `declared` pins the column type. `None`, `Unknown` and `Missing` leave it to be inferred.
    pub fn new(options: &BuilderOptions, declared: Option<ValueType>) -> BuilderResult<Self> {
        options.validate()?;
        let aggregate = declared.unwrap_or_default();
        let segments = (0..options.segment_count)
            .map(|index| Mutex::new(SegmentBuffer::new(index, options.block_size)))
            .collect();

        Ok(Self {
            pinned: !matches!(aggregate, ValueType::Unknown | ValueType::Missing),
            block_size: options.block_size,
            shared: Mutex::new(Shared {
                closed: false,
                aggregate,
                history: HistoryRing::with_capacity(options.history_capacity),
                stats: BuilderStats::default(),
            }),
            segments,
        })
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    fn check_segment(&self, segment: usize) -> BuilderResult<&Mutex<SegmentBuffer>> {
        self.segments
            .get(segment)
            .ok_or(BuilderError::InvalidSegment {
                segment,
                segment_count: self.segments.len(),
            })
    }

    fn open_shared(&self) -> BuilderResult<MutexGuard<'_, Shared>> {
        let shared = lock(&self.shared);
        if shared.closed {
            return Err(BuilderError::AlreadyClosed);
        }
        Ok(shared)
    }

    /// Validate `value` against the current aggregate type without storing it.
    pub fn check(&self, value: &Value) -> BuilderResult<()> {
        self.open_shared()?.check(self.pinned, value).map(|_| ())
    }

    pub fn append(&self, value: Value, segment: usize) -> BuilderResult<()> {
        let mut buffer = lock(self.check_segment(segment)?);
        let value = {
            let mut shared = self.open_shared()?;
            match shared.check(self.pinned, &value) {
                Ok(next) => shared.commit(next, value),
                Err(err) => {
                    shared.stats.rejected += 1;
                    return Err(err);
                }
            }
        };
        buffer.append(value);
        Ok(())
    }

    /// Append every value of `values` to `segment`, skipping (and reporting) values that do not fit.
    ///
    /// The input is pulled lazily in blocks of `block_size`; each block is validated under one
    /// acquisition of the shared lock and then forwarded to the segment in a single batch.
    pub fn append_multiple<I>(&self, values: I, segment: usize) -> BuilderResult<AppendReport>
    where
        I: IntoIterator<Item = Value>,
    {
        let segment_lock = self.check_segment(segment)?;
        drop(self.open_shared()?);

        let mut report = AppendReport::default();
        let mut position = 0usize;
        let mut values = values.into_iter();
        let mut block: Vec<Value> = Vec::with_capacity(self.block_size);

        loop {
            block.extend(values.by_ref().take(self.block_size));
            if block.is_empty() {
                break;
            }

            let mut buffer = lock(segment_lock);
            let accepted = {
                let mut shared = self.open_shared()?;
                let mut accepted = Vec::with_capacity(block.len());
                for value in block.drain(..) {
                    match shared.check(self.pinned, &value) {
                        Ok(next) => accepted.push(shared.commit(next, value)),
                        Err(error) => {
                            shared.stats.rejected += 1;
                            report.rejections.push(Rejection {
                                position,
                                value,
                                error,
                            });
                        }
                    }
                    position += 1;
                }
                accepted
            };
            report.accepted += accepted.len();
            buffer.append_batch(accepted);
        }

        if !report.is_clean() {
            log::warn!(
                "skipped {} of {} values appended to segment {segment}",
                report.rejected(),
                position
            );
        }
        Ok(report)
    }

    pub fn get_type(&self) -> BuilderResult<ValueType> {
        Ok(self.open_shared()?.aggregate)
    }

    pub fn read_history(&self, n: usize) -> BuilderResult<Vec<Value>> {
        Ok(self.open_shared()?.history.read(n))
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.shared).closed
    }

    pub fn stats(&self) -> BuilderStats {
        lock(&self.shared).stats.clone()
    }

    pub fn segment_lengths(&self) -> Vec<usize> {
        self.segments.iter().map(|s| lock(s).len()).collect()
    }

    /// Transition to closed and hand over the staged segments in index order.
    pub fn close(&self) -> BuilderResult<StagedSegments> {
        let element_type = {
            let mut shared = self.open_shared()?;
            shared.closed = true;
            shared.history = HistoryRing::with_capacity(0);
            shared.aggregate
        };

        let segments: Vec<SegmentBuffer> = self.segments.iter().map(|s| lock(s).take()).collect();
        log::debug!(
            "closing {element_type} column with segment lengths {:?}",
            segments.iter().map(SegmentBuffer::len).collect::<Vec<_>>()
        );

        Ok(StagedSegments {
            element_type,
            segments,
        })
    }
}
