//! Property tests: exactness, partition invariance and monotonicity in k.

use knn_shard::{squared_euclidean, Shard, Vector};
use proptest::prelude::*;
use std::collections::HashSet;

const DIM: usize = 3;

fn points_strategy() -> impl Strategy<Value = Vec<Vec<f32>>> {
    prop::collection::vec(prop::collection::vec(-100.0f32..100.0, DIM), 0..80)
}

fn query_strategy() -> impl Strategy<Value = Vec<f32>> {
    prop::collection::vec(-100.0f32..100.0, DIM)
}

fn build(points: &[Vec<f32>], workers: usize) -> Shard {
    let shard = Shard::new(workers, DIM).unwrap();
    for (i, p) in points.iter().enumerate() {
        shard.insert(format!("p{}", i), Vector::new(p.clone())).unwrap();
    }
    shard.freeze().unwrap();
    shard
}

proptest! {
    #[test]
    fn returns_true_nearest(points in points_strategy(), query in query_strategy(), k in 0usize..100) {
        let shard = build(&points, 3);
        let results = shard.search(&Vector::new(query.clone()), k).unwrap();

        prop_assert_eq!(results.len(), k.min(points.len()));
        for pair in results.windows(2) {
            prop_assert!(pair[0].distance <= pair[1].distance);
        }

        let returned: HashSet<&str> = results.iter().map(|r| r.id.as_str()).collect();
        let worst = results.last().map(|r| r.distance).unwrap_or(f32::NEG_INFINITY);
        for (i, p) in points.iter().enumerate() {
            let id = format!("p{}", i);
            if !returned.contains(id.as_str()) && !results.is_empty() {
                let d = squared_euclidean(p, &query).unwrap();
                prop_assert!(d >= worst, "{} at {} beats returned worst {}", id, d, worst);
            }
        }
    }

    #[test]
    fn worker_count_does_not_change_answer(
        points in points_strategy(),
        query in query_strategy(),
        k in 1usize..20,
        workers in 2usize..9,
    ) {
        let query = Vector::new(query);
        let single = build(&points, 1).search(&query, k).unwrap();
        let many = build(&points, workers).search(&query, k).unwrap();
        prop_assert_eq!(single, many);
    }

    #[test]
    fn smaller_k_is_prefix_of_larger_k(
        points in points_strategy(),
        query in query_strategy(),
        k1 in 0usize..40,
        extra in 0usize..40,
    ) {
        let shard = build(&points, 4);
        let query = Vector::new(query);
        let small = shard.search(&query, k1).unwrap();
        let large = shard.search(&query, k1 + extra).unwrap();
        prop_assert_eq!(&small[..], &large[..small.len()]);
    }
}
