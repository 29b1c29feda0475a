//! Order-preserving parallel map
//!
//! Chunk encode/write and read/decode tasks run on a bounded Rayon pool.
//! Results always come back aligned with their inputs, whatever order the
//! workers finish in.

use rayon::prelude::*;
use rayon::ThreadPool;
use tracing::{debug, warn};

/// Number of workers used when none is configured
pub fn default_workers() -> usize {
    std::thread::available_parallelism().map_or(1, |n| n.get())
}

enum Pool {
    Rayon(ThreadPool),
    Inline,
}

/// Bounded worker pool with an order-preserving `map`
pub struct ParallelExecutor {
    pool: Pool,
    workers: usize,
}

impl ParallelExecutor {
    /// Create an executor with `workers` threads.
    ///
    /// One worker (or zero) runs tasks inline on the calling thread. If the
    /// OS refuses to spawn threads the pool is halved until it fits, and
    /// finally falls back to inline execution.
    pub fn new(workers: usize) -> Self {
        let mut threads = workers.max(1);
        if threads == 1 {
            return Self::serial();
        }

        loop {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .thread_name(|idx| format!("memocache-worker-{idx}"))
                .build()
            {
                Ok(pool) => {
                    debug!("Started worker pool with {} threads", threads);
                    return Self {
                        pool: Pool::Rayon(pool),
                        workers: threads,
                    };
                }
                Err(err) if threads > 1 => {
                    warn!("Failed to start {} workers ({}), retrying smaller", threads, err);
                    threads = (threads / 2).max(1);
                    if threads == 1 {
                        return Self::serial();
                    }
                }
                Err(_) => return Self::serial(),
            }
        }
    }

    /// Executor that runs every task on the calling thread
    pub fn serial() -> Self {
        Self {
            pool: Pool::Inline,
            workers: 1,
        }
    }

    /// Effective worker count
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Apply `f` to every input and return the outputs in input order.
    ///
    /// Blocks until all tasks finish; there is no early exit.
    pub fn map<I, O, F>(&self, inputs: Vec<I>, f: F) -> Vec<O>
    where
        I: Send,
        O: Send,
        F: Fn(I) -> O + Send + Sync,
    {
        match &self.pool {
            Pool::Rayon(pool) => pool.install(|| inputs.into_par_iter().map(f).collect()),
            Pool::Inline => inputs.into_iter().map(f).collect(),
        }
    }
}

impl Default for ParallelExecutor {
    fn default() -> Self {
        Self::new(default_workers())
    }
}

impl std::fmt::Debug for ParallelExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.pool {
            Pool::Rayon(_) => "rayon",
            Pool::Inline => "inline",
        };
        f.debug_struct("ParallelExecutor")
            .field("pool", &kind)
            .field("workers", &self.workers)
            .finish()
    }
}
