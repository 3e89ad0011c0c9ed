//! Rayon thread pool for the parallel enumeration path.
//!
//! [WorkerPool::install] runs a closure on a pool with a fixed number of
//! threads, or on Rayon's global pool (all cores) when no count is set.

use rayon::ThreadPoolBuilder;
use tracing::warn;

/// How many worker threads the outer search branches are spread over.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkerPool {
    /// Number of worker threads. If 0, use the Rayon global pool.
    pub workers: usize,
}

impl WorkerPool {
    pub fn with_workers(n: usize) -> Self {
        Self { workers: n }
    }

    /// Run `f` on a pool with this worker count. If a dedicated pool cannot be
    /// built, `f` runs on the global pool instead.
    pub fn install<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        if self.workers == 0 {
            return f();
        }
        match ThreadPoolBuilder::new().num_threads(self.workers).build() {
            Ok(pool) => pool.install(f),
            Err(err) => {
                warn!(workers = self.workers, error = %err, "thread pool unavailable, using global pool");
                f()
            }
        }
    }
}
