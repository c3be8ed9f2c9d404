//! Benchmarks for shard search across worker counts

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use knn_shard::{Shard, Vector};

const DIM: usize = 128;
const POINTS: usize = 20_000;

fn build_shard(workers: usize) -> Shard {
    let shard = Shard::new(workers, DIM).unwrap();
    for i in 0..POINTS {
        let data: Vec<f32> = (0..DIM).map(|_| rand::random::<f32>()).collect();
        shard.insert(format!("v{}", i), Vector::new(data)).unwrap();
    }
    shard.freeze().unwrap();
    shard
}

fn benchmark_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");
    let query = Vector::new(vec![0.5; DIM]);

    for workers in [1, 2, 4, 8].iter() {
        let shard = build_shard(*workers);
        group.bench_with_input(BenchmarkId::new("workers", workers), workers, |b, _| {
            b.iter(|| shard.search(black_box(&query), black_box(10)).unwrap());
        });
    }

    group.finish();
}

fn benchmark_freeze(c: &mut Criterion) {
    let shard = build_shard(1);
    c.bench_function("freeze", |b| b.iter(|| shard.freeze().unwrap()));
}

criterion_group!(benches, benchmark_search, benchmark_freeze);
criterion_main!(benches);
