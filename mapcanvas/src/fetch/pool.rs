//! Fetch worker pool.
//!
//! Owns a fixed set of [`FetchWorker`]s sharing one dispatcher and one
//! fetch source, started and stopped as a unit. The pool never resizes at
//! runtime; the worker count is set once at construction.

use std::sync::Arc;

use tracing::info;

use crate::fetch::{FetchDispatcher, FetchWorker, TileFetcher};

/// Default number of fetch workers.
pub const DEFAULT_WORKER_COUNT: usize = 4;

/// Supervisor over N fetch workers.
pub struct FetchPool {
    workers: Vec<FetchWorker>,
}

impl FetchPool {
    /// Creates a pool with the default worker count.
    pub fn new(dispatcher: Arc<dyn FetchDispatcher>, fetcher: Arc<dyn TileFetcher>) -> Self {
        Self::with_workers(dispatcher, fetcher, DEFAULT_WORKER_COUNT)
    }

    /// Creates a pool with an explicit worker count.
    pub fn with_workers(
        dispatcher: Arc<dyn FetchDispatcher>,
        fetcher: Arc<dyn TileFetcher>,
        count: usize,
    ) -> Self {
        let workers = (0..count)
            .map(|id| FetchWorker::new(id, Arc::clone(&dispatcher), Arc::clone(&fetcher)))
            .collect();
        Self { workers }
    }

    /// Starts every worker. Safe to call while already running.
    pub fn start(&mut self) {
        for worker in &mut self.workers {
            worker.start();
        }
        info!(workers = self.workers.len(), "fetch pool started");
    }

    /// Stops every worker and waits for all loops to exit.
    ///
    /// The stop signal is fanned out first, then each worker is joined, so
    /// the pool drains in the time of one in-flight fetch rather than one
    /// per worker. After this returns, no worker will write to the cache, so
    /// tearing the cache down cannot race a straggler.
    pub async fn stop(&mut self) {
        for worker in &self.workers {
            worker.signal_stop();
        }
        for worker in &mut self.workers {
            worker.stop().await;
        }
        info!(workers = self.workers.len(), "fetch pool stopped");
    }

    /// Number of workers owned by the pool.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Whether any worker loop is currently running.
    pub fn is_running(&self) -> bool {
        self.workers.iter().any(FetchWorker::is_running)
    }
}
