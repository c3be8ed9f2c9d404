//! In-memory vector storage and its frozen scan layout

use crate::error::Result;
use crate::vector::Vector;
use std::collections::HashMap;
use std::ops::Range;

/// Mutable identifier -> vector mapping. The map is the single source of
/// truth; duplicate identifiers are last-write-wins.
#[derive(Debug)]
pub struct VectorStore {
    vectors: HashMap<String, Vector>,
    /// Enforced vector dimension
    dimension: usize,
    /// Number of successful `insert` calls, including overwrites
    insert_count: usize,
    /// Inserts since the last `freeze`
    pending: usize,
}

impl VectorStore {
    /// Create an empty store accepting vectors of exactly `dimension` components.
    pub fn new(dimension: usize) -> Self {
        Self {
            vectors: HashMap::new(),
            dimension,
            insert_count: 0,
            pending: 0,
        }
    }

    /// Insert a vector with the given ID, replacing any vector already stored under it.
    pub fn insert(&mut self, id: impl Into<String>, vector: Vector) -> Result<()> {
        vector.validate(self.dimension)?;
        self.vectors.insert(id.into(), vector);
        self.insert_count += 1;
        self.pending += 1;
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Vector> {
        self.vectors.get(id)
    }

    /// Number of distinct identifiers
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Number of `insert` calls that succeeded
    pub fn insert_count(&self) -> usize {
        self.insert_count
    }

    /// Inserts not yet reflected in a frozen layout
    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Build the scan layout from the current contents.
    ///
    /// Points are laid out in identifier order, so freezing the same contents
    /// twice yields identical layouts.
    pub fn freeze(&mut self) -> FrozenLayout {
        let mut entries: Vec<(&String, &Vector)> = self.vectors.iter().collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));

        let mut ids = Vec::with_capacity(entries.len());
        let mut data = Vec::with_capacity(entries.len() * self.dimension);
        for (id, vector) in entries {
            ids.push(id.clone());
            data.extend_from_slice(vector.as_slice());
        }

        self.pending = 0;
        FrozenLayout {
            ids,
            data,
            dimension: self.dimension,
        }
    }

    /// A stored vector chosen by index into the identifier-sorted order.
    pub(crate) fn nth_sorted(&self, n: usize) -> Option<&Vector> {
        let mut keys: Vec<&String> = self.vectors.keys().collect();
        keys.sort_unstable();
        keys.get(n).and_then(|id| self.vectors.get(id.as_str()))
    }
}

/// Immutable, scan-optimized snapshot of a store: parallel identifier and
/// row-major component arrays.
#[derive(Debug, Clone, PartialEq)]
pub struct FrozenLayout {
    ids: Vec<String>,
    data: Vec<f32>,
    dimension: usize,
}

impl FrozenLayout {
    /// Number of points
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn id(&self, index: usize) -> &str {
        &self.ids[index]
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Components of the point at `index`.
    #[inline]
    pub fn vector(&self, index: usize) -> &[f32] {
        let start = index * self.dimension;
        &self.data[start..start + self.dimension]
    }

    /// Contiguous component rows for the points in `range`.
    #[inline]
    pub fn rows(&self, range: Range<usize>) -> &[f32] {
        &self.data[range.start * self.dimension..range.end * self.dimension]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ShardError;

    #[test]
    fn test_insert_and_get() {
        let mut store = VectorStore::new(3);
        let v = Vector::new(vec![1.0, 2.0, 3.0]);
        store.insert("v1", v.clone()).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("v1"), Some(&v));
    }

    #[test]
    fn test_dimension_consistency() {
        let mut store = VectorStore::new(3);
        let result = store.insert("v2", Vector::new(vec![1.0, 2.0]));
        assert!(matches!(result, Err(ShardError::DimensionMismatch { .. })));
        assert_eq!(store.insert_count(), 0);
    }

    #[test]
    fn test_non_finite_rejected() {
        let mut store = VectorStore::new(2);
        let result = store.insert("bad", Vector::new(vec![0.0, f32::INFINITY]));
        assert!(matches!(result, Err(ShardError::NonFiniteComponent { index: 1 })));
        assert!(store.is_empty());
        assert_eq!(store.pending(), 0);
    }

    #[test]
    fn test_duplicate_id_last_write_wins() {
        let mut store = VectorStore::new(2);
        store.insert("a", Vector::new(vec![1.0, 1.0])).unwrap();
        store.insert("a", Vector::new(vec![2.0, 2.0])).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.insert_count(), 2);
        assert_eq!(store.get("a").unwrap().as_slice(), &[2.0, 2.0]);

        let layout = store.freeze();
        assert_eq!(layout.len(), 1);
        assert_eq!(layout.vector(0), &[2.0, 2.0]);
    }

    #[test]
    fn test_freeze_layout_is_sorted_and_contiguous() {
        let mut store = VectorStore::new(2);
        store.insert("b", Vector::new(vec![3.0, 4.0])).unwrap();
        store.insert("a", Vector::new(vec![1.0, 2.0])).unwrap();
        store.insert("c", Vector::new(vec![5.0, 6.0])).unwrap();

        let layout = store.freeze();
        assert_eq!(layout.ids(), &["a", "b", "c"]);
        assert_eq!(layout.vector(1), &[3.0, 4.0]);
        assert_eq!(layout.rows(1..3), &[3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_freeze_twice_is_identical() {
        let mut store = VectorStore::new(1);
        for i in 0..50 {
            store.insert(format!("p{}", i), Vector::new(vec![i as f32])).unwrap();
        }
        assert_eq!(store.pending(), 50);
        let first = store.freeze();
        assert_eq!(store.pending(), 0);
        assert_eq!(first, store.freeze());
    }

    #[test]
    fn test_empty_freeze() {
        let mut store = VectorStore::new(4);
        let layout = store.freeze();
        assert!(layout.is_empty());
        assert_eq!(layout.rows(0..0), &[] as &[f32]);
    }
}
