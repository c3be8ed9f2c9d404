//! Squared Euclidean distance

use crate::error::{Result, ShardError};

/// Compute the squared Euclidean (L2²) distance between two slices.
///
/// The square root is skipped: it is monotonic, so the squared value ranks
/// points identically. Slices of different length are rejected.
pub fn squared_euclidean(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(ShardError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(squared_euclidean_unchecked(a, b))
}

/// Hot-loop variant for callers that have already validated lengths.
/// Extra components on the longer side are ignored.
#[inline]
pub(crate) fn squared_euclidean_unchecked(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}
