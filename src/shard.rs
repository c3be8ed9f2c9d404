//! Shard orchestration: partitioned parallel scan plus top-k merge.

use crate::config::ShardConfig;
use crate::error::{Result, ShardError};
use crate::loader::read_points;
use crate::store::{FrozenLayout, VectorStore};
use crate::top_k::{BoundedTopK, Candidate, ResultRecord};
use crate::vector::Vector;
use crate::worker::{partition, CancellationToken, Worker};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{
    Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, TryLockError,
};
use std::time::Instant;
use tracing::{debug, info};

#[derive(Debug)]
struct ShardState {
    store: VectorStore,
    layout: Option<FrozenLayout>,
}

/// One partition of a dataset, searched by exact brute force.
///
/// Searches share the frozen layout under a read lock held for the whole
/// query. Mutations (`insert`, `freeze`, loading) queue behind each other,
/// but fail with [`ShardError::ConcurrentMutation`] instead of waiting for an
/// in-flight search.
#[derive(Debug)]
pub struct Shard {
    config: ShardConfig,
    pool: rayon::ThreadPool,
    state: RwLock<ShardState>,
    /// Serializes mutations so they only ever contend with searches
    writer: Mutex<()>,
    /// Searches currently holding the read lock
    searches: AtomicUsize,
}

/// Exclusive access to the shard state for one mutation.
struct WriteAccess<'a> {
    state: RwLockWriteGuard<'a, ShardState>,
    _writer: MutexGuard<'a, ()>,
}

impl Deref for WriteAccess<'_> {
    type Target = ShardState;

    fn deref(&self) -> &ShardState {
        &self.state
    }
}

impl DerefMut for WriteAccess<'_> {
    fn deref_mut(&mut self) -> &mut ShardState {
        &mut self.state
    }
}

/// Marks a search as in flight until dropped.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl Shard {
    /// Create a shard with `worker_count` scan workers over vectors of `embedding_size` components.
    pub fn new(worker_count: usize, embedding_size: usize) -> Result<Self> {
        Self::with_config(ShardConfig::new(worker_count, embedding_size))
    }

    pub fn with_config(config: ShardConfig) -> Result<Self> {
        config.validate()?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.worker_count)
            .thread_name(|i| format!("knn-shard-worker-{}", i))
            .build()
            .map_err(|e| ShardError::ThreadPool(e.to_string()))?;

        Ok(Self {
            pool,
            state: RwLock::new(ShardState {
                store: VectorStore::new(config.embedding_size),
                layout: None,
            }),
            writer: Mutex::new(()),
            searches: AtomicUsize::new(0),
            config,
        })
    }

    /// Insert a point. A repeated id replaces the earlier vector.
    pub fn insert(&self, id: impl Into<String>, vector: Vector) -> Result<()> {
        vector.validate(self.config.embedding_size)?;
        self.write_state()?.store.insert(id, vector)
    }

    /// Rebuild the scan layout from the current contents.
    pub fn freeze(&self) -> Result<()> {
        let mut state = self.write_state()?;
        let started = Instant::now();
        let layout = state.store.freeze();
        debug!(
            points = layout.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "froze shard layout"
        );
        state.layout = Some(layout);
        Ok(())
    }

    /// Return the `k` points nearest to `query`, ascending by squared distance
    /// and then by id.
    pub fn search(&self, query: &Vector, k: usize) -> Result<Vec<ResultRecord>> {
        self.run_search(query, k, None)
    }

    /// Like [`search`](Self::search), but workers stop early once `token` is
    /// cancelled and the query fails with [`ShardError::Cancelled`].
    pub fn search_with_cancel(
        &self,
        query: &Vector,
        k: usize,
        token: &CancellationToken,
    ) -> Result<Vec<ResultRecord>> {
        self.run_search(query, k, Some(token))
    }

    fn run_search(
        &self,
        query: &Vector,
        k: usize,
        cancel: Option<&CancellationToken>,
    ) -> Result<Vec<ResultRecord>> {
        query.validate(self.config.embedding_size)?;

        let (state, _in_flight) = self.begin_search()?;
        let layout = state.layout.as_ref().ok_or(ShardError::NotFrozen)?;
        let pending = state.store.pending();
        if pending > 0 {
            return Err(ShardError::StaleLayout { pending });
        }
        if k == 0 || layout.is_empty() {
            return Ok(Vec::new());
        }

        let started = Instant::now();
        let ranges = partition(layout.len(), self.config.worker_count);
        let locals = self.scan(layout, ranges, query.as_slice(), k, cancel)?;

        let mut merged = BoundedTopK::new(k);
        for local in locals {
            for candidate in local.into_sorted_vec() {
                merged.offer(candidate);
            }
        }

        let results: Vec<ResultRecord> = merged
            .into_sorted_vec()
            .into_iter()
            .map(|c| ResultRecord::new(layout.id(c.index), c.distance))
            .collect();
        debug!(
            k,
            points = layout.len(),
            workers = self.config.worker_count,
            returned = results.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "search complete"
        );
        Ok(results)
    }

    /// Run one worker per range on the pool and wait for all of them.
    /// Local results come back in worker order.
    fn scan(
        &self,
        layout: &FrozenLayout,
        ranges: Vec<std::ops::Range<usize>>,
        query: &[f32],
        k: usize,
        cancel: Option<&CancellationToken>,
    ) -> Result<Vec<BoundedTopK<Candidate>>> {
        let interval = self.config.cancel_check_interval;
        let locals: Vec<Result<BoundedTopK<Candidate>>> = self.pool.install(|| {
            ranges
                .into_par_iter()
                .enumerate()
                .map(|(i, range)| {
                    Worker::new(i, layout, range, query)
                        .with_check_interval(interval)
                        .run(k, cancel)
                })
                .collect()
        });

        join_workers(locals)
    }

    /// Insert every point decoded from a comma-delimited reader.
    ///
    /// Returns the number of points inserted. On a malformed line the points
    /// before it stay inserted and the error names the line.
    pub fn load_from_reader<R: BufRead>(&self, reader: R) -> Result<usize> {
        let mut state = self.write_state()?;
        let mut count = 0;
        for point in read_points(reader, self.config.embedding_size) {
            let (id, vector) = point?;
            state.store.insert(id, vector)?;
            count += 1;
        }
        info!(count, distinct = state.store.len(), "loaded points");
        Ok(count)
    }

    pub fn load_from_path(&self, path: impl AsRef<Path>) -> Result<usize> {
        let file = File::open(path.as_ref())?;
        self.load_from_reader(BufReader::new(file))
    }

    /// A stored vector picked with a seeded RNG, for generating load-test queries.
    pub fn sample_vector(&self, seed: u64) -> Result<Option<Vector>> {
        let state = self.read_state()?;
        if state.store.is_empty() {
            return Ok(None);
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let n = rng.gen_range(0..state.store.len());
        Ok(state.store.nth_sorted(n).cloned())
    }

    /// Number of distinct ids stored
    pub fn len(&self) -> usize {
        self.state_unpoisoned().store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of successful `insert` calls, counting overwrites
    pub fn insert_count(&self) -> usize {
        self.state_unpoisoned().store.insert_count()
    }

    /// Whether a layout exists and reflects every insert.
    pub fn is_frozen(&self) -> bool {
        let state = self.state_unpoisoned();
        state.layout.is_some() && state.store.pending() == 0
    }

    pub fn worker_count(&self) -> usize {
        self.config.worker_count
    }

    pub fn embedding_size(&self) -> usize {
        self.config.embedding_size
    }

    pub fn config(&self) -> &ShardConfig {
        &self.config
    }

    fn read_state(&self) -> Result<RwLockReadGuard<'_, ShardState>> {
        self.state.read().map_err(|_| ShardError::LockPoisoned)
    }

    fn begin_search(&self) -> Result<(RwLockReadGuard<'_, ShardState>, InFlight<'_>)> {
        let state = self.read_state()?;
        self.searches.fetch_add(1, Ordering::AcqRel);
        Ok((state, InFlight(&self.searches)))
    }

    /// Take exclusive access for a mutation. Other mutations are waited for;
    /// an in-flight search is not.
    fn write_state(&self) -> Result<WriteAccess<'_>> {
        let writer = self.writer.lock().map_err(|_| ShardError::LockPoisoned)?;
        let state = match self.state.try_write() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(_)) => return Err(ShardError::LockPoisoned),
            Err(TryLockError::WouldBlock) => {
                if self.searches.load(Ordering::Acquire) > 0 {
                    return Err(ShardError::ConcurrentMutation);
                }
                // Held by a short accessor read such as len().
                self.state.write().map_err(|_| ShardError::LockPoisoned)?
            }
        };
        Ok(WriteAccess {
            state,
            _writer: writer,
        })
    }

    fn state_unpoisoned(&self) -> RwLockReadGuard<'_, ShardState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Collect per-worker results in worker order. Any worker error other than
/// cancellation fails the whole search; partial answers are never returned.
fn join_workers(
    locals: Vec<Result<BoundedTopK<Candidate>>>,
) -> Result<Vec<BoundedTopK<Candidate>>> {
    locals
        .into_iter()
        .enumerate()
        .map(|(worker, local)| {
            local.map_err(|e| match e {
                ShardError::Cancelled => ShardError::Cancelled,
                other => ShardError::WorkerFailure {
                    worker,
                    source: Box::new(other),
                },
            })
        })
        .collect()
}
