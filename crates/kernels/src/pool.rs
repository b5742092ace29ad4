use crate::errors::Result;
use log::debug;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::fmt;
use std::sync::OnceLock;

/// Default number of workers used for parallel inversion and Gram matrix evaluation
pub const DEFAULT_N_WORKERS: usize = 3;

/// A fixed-size pool of worker threads owned by the component using it.
///
/// Threads are started lazily on first use and stopped by [`WorkerPool::shutdown`]
/// or when the pool is dropped. A pool that was shut down is restarted on next use.
pub struct WorkerPool {
    n_workers: usize,
    pool: OnceLock<ThreadPool>,
}

impl WorkerPool {
    /// Constructor of a pool of `n_workers` threads (at least one)
    pub fn new(n_workers: usize) -> Self {
        WorkerPool {
            n_workers: n_workers.max(1),
            pool: OnceLock::new(),
        }
    }

    /// Number of worker threads
    pub fn n_workers(&self) -> usize {
        self.n_workers
    }

    /// Whether worker threads are currently running
    pub fn is_active(&self) -> bool {
        self.pool.get().is_some()
    }

    fn pool(&self) -> Result<&ThreadPool> {
        if let Some(pool) = self.pool.get() {
            return Ok(pool);
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.n_workers)
            .thread_name(|i| format!("kernel-worker-{i}"))
            .build()?;
        debug!("Start worker pool with {} threads", self.n_workers);
        // a concurrent initialization may win, the pool built here is then dropped
        Ok(self.pool.get_or_init(|| pool))
    }

    /// Run `op` within the pool: parallel iterators and `rayon::join` calls made by `op`
    /// are dispatched to the pool workers. The caller blocks until `op` completes.
    pub fn install<OP, R>(&self, op: OP) -> Result<R>
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        Ok(self.pool()?.install(op))
    }

    /// Stop the worker threads
    pub fn shutdown(&mut self) {
        if self.pool.take().is_some() {
            debug!("Shutdown worker pool");
        }
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        WorkerPool::new(DEFAULT_N_WORKERS)
    }
}

/// A cloned pool has the same size but its own threads
impl Clone for WorkerPool {
    fn clone(&self) -> Self {
        WorkerPool::new(self.n_workers)
    }
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("n_workers", &self.n_workers)
            .field("active", &self.is_active())
            .finish()
    }
}
