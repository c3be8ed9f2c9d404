//! Range partitioning and the per-worker linear scan

use crate::distance::squared_euclidean_unchecked;
use crate::error::{Result, ShardError};
use crate::store::FrozenLayout;
use crate::top_k::{BoundedTopK, Candidate};
use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Split `[0, total)` into `workers` contiguous ranges.
///
/// The remainder of `total / workers` is spread one item at a time over the
/// leading ranges, so sizes differ by at most one. When `workers > total` the
/// trailing ranges are empty.
pub fn partition(total: usize, workers: usize) -> Vec<Range<usize>> {
    if workers == 0 {
        return Vec::new();
    }
    let base = total / workers;
    let rem = total % workers;

    let mut ranges = Vec::with_capacity(workers);
    let mut start = 0;
    for i in 0..workers {
        let len = base + usize::from(i < rem);
        ranges.push(start..start + len);
        start += len;
    }
    ranges
}

/// Shared flag that asks in-flight scans to stop early.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Scans one disjoint range of a frozen layout against a query.
#[derive(Debug)]
pub struct Worker<'a> {
    id: usize,
    layout: &'a FrozenLayout,
    range: Range<usize>,
    query: &'a [f32],
    /// Scanned indices between cancellation checks
    check_interval: usize,
}

impl<'a> Worker<'a> {
    pub fn new(id: usize, layout: &'a FrozenLayout, range: Range<usize>, query: &'a [f32]) -> Self {
        Self {
            id,
            layout,
            range,
            query,
            check_interval: usize::MAX,
        }
    }

    /// Poll a cancellation token every `interval` scanned points.
    pub fn with_check_interval(mut self, interval: usize) -> Self {
        self.check_interval = interval.max(1);
        self
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn range(&self) -> Range<usize> {
        self.range.clone()
    }

    /// Scan the whole range, keeping the `k` nearest points.
    ///
    /// Returned candidates carry indices into the layout. A length mismatch
    /// between the query and the layout fails the worker before scanning.
    pub fn run(&self, k: usize, cancel: Option<&CancellationToken>) -> Result<BoundedTopK<Candidate>> {
        let dim = self.layout.dimension();
        if self.query.len() != dim {
            return Err(ShardError::DimensionMismatch {
                expected: dim,
                actual: self.query.len(),
            });
        }

        let mut top = BoundedTopK::new(k);
        if k == 0 {
            return Ok(top);
        }
        // Zero-width rows cannot be chunked; every point sits at the origin.
        if dim == 0 {
            for i in self.range.clone() {
                top.offer(Candidate::new(i, 0.0));
            }
            return Ok(top);
        }

        let mut index = self.range.start;
        let mut since_check = 0;
        for row in self.layout.rows(self.range.clone()).chunks_exact(dim) {
            if let Some(token) = cancel {
                since_check += 1;
                if since_check >= self.check_interval {
                    since_check = 0;
                    if token.is_cancelled() {
                        return Err(ShardError::Cancelled);
                    }
                }
            }
            top.offer(Candidate::new(index, squared_euclidean_unchecked(row, self.query)));
            index += 1;
        }
        Ok(top)
    }
}
