//! Bounded top-k selection over a max-heap.
//!
//! Both the per-worker scan and the cross-worker merge go through
//! [`BoundedTopK::offer`], so a record wins in exactly the same way in both
//! places. Records are ranked by distance, then by identifier, which makes the
//! final answer independent of how the scan was partitioned.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Upper bound on the capacity reserved up front; larger `k` grows on demand.
const MAX_PREALLOC: usize = 4096;

/// A search result: an identifier and its squared distance to the query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultRecord {
    pub id: String,
    pub distance: f32,
}

impl ResultRecord {
    pub fn new(id: impl Into<String>, distance: f32) -> Self {
        Self {
            id: id.into(),
            distance,
        }
    }
}

impl PartialEq for ResultRecord {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ResultRecord {}

impl PartialOrd for ResultRecord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ResultRecord {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// A scan hit addressed by its position in a frozen layout.
///
/// Layout positions are assigned in identifier order, so ranking by
/// `(distance, index)` agrees with ranking the corresponding `ResultRecord`s.
#[derive(Debug, Clone, Copy)]
pub struct Candidate {
    pub distance: f32,
    pub index: usize,
}

impl Candidate {
    pub fn new(index: usize, distance: f32) -> Self {
        Self { distance, index }
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| self.index.cmp(&other.index))
    }
}

/// Keeps the `k` smallest records offered so far.
///
/// The worst retained record sits on top of the heap, so each `offer` is
/// O(log k).
#[derive(Debug, Clone)]
pub struct BoundedTopK<T: Ord = ResultRecord> {
    heap: BinaryHeap<T>,
    k: usize,
}

impl<T: Ord> BoundedTopK<T> {
    /// Create an empty tracker retaining at most `k` records.
    pub fn new(k: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(k.min(MAX_PREALLOC)),
            k,
        }
    }

    /// Offer a record. Returns `true` if it was retained.
    ///
    /// While below capacity every record is kept. At capacity the record
    /// replaces the current worst only if it ranks strictly better.
    pub fn offer(&mut self, record: T) -> bool {
        if self.heap.len() < self.k {
            self.heap.push(record);
            return true;
        }
        match self.heap.peek_mut() {
            Some(mut worst) if record < *worst => {
                *worst = record;
                true
            }
            _ => false,
        }
    }

    /// The worst retained record, i.e. the one the next offer must beat once full.
    pub fn worst(&self) -> Option<&T> {
        self.heap.peek()
    }

    pub fn is_full(&self) -> bool {
        self.heap.len() >= self.k
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Maximum number of records retained (k).
    pub fn capacity(&self) -> usize {
        self.k
    }

    /// Take the retained records sorted ascending, leaving the tracker empty
    /// and ready for reuse with the same `k`.
    pub fn drain(&mut self) -> Vec<T> {
        std::mem::take(&mut self.heap).into_sorted_vec()
    }

    /// Consume the tracker, returning records sorted ascending.
    pub fn into_sorted_vec(self) -> Vec<T> {
        self.heap.into_sorted_vec()
    }
}
