//! # knn_shard
//!
//! Exact brute-force k-nearest-neighbor search over one shard of a larger
//! similarity-search dataset.
//!
//! This library provides:
//! - Point storage with last-write-wins identifiers
//! - A frozen, contiguous layout for linear scanning
//! - Squared Euclidean distance
//! - Partitioned parallel scans merged into one exact top-k answer
//!
//! ## Example
//!
//! ```rust
//! use knn_shard::{Shard, Vector};
//!
//! let shard = Shard::new(4, 2).unwrap();
//! shard.insert("A", Vector::new(vec![0.0, 0.0])).unwrap();
//! shard.insert("B", Vector::new(vec![1.0, 0.0])).unwrap();
//! shard.insert("C", Vector::new(vec![0.0, 5.0])).unwrap();
//! shard.freeze().unwrap();
//!
//! let results = shard.search(&Vector::new(vec![0.0, 0.0]), 2).unwrap();
//! assert_eq!(results[0].id, "A");
//! assert_eq!(results[1].id, "B");
//! ```

pub mod config;
pub mod distance;
pub mod error;
pub mod loader;
pub mod shard;
pub mod store;
pub mod top_k;
pub mod vector;
pub mod worker;

pub use config::ShardConfig;
pub use distance::squared_euclidean;
pub use error::{Result, ShardError};
pub use shard::Shard;
pub use store::{FrozenLayout, VectorStore};
pub use top_k::{BoundedTopK, Candidate, ResultRecord};
pub use vector::Vector;
pub use worker::{partition, CancellationToken, Worker};
