//! Fetch worker: one cooperative fetch+decode loop.
//!
//! A worker repeatedly asks its dispatcher for work, runs the fetch+decode,
//! and reports the outcome. Per request it moves through
//! waiting-for-work → fetching/decoding → reporting; an external stop signal
//! exits the loop at the next safe point (an in-flight fetch always runs to
//! completion), and a stopped worker can be started again.
//!
//! Failures are isolated per request: an error, or a panic escaping the
//! fetch path, becomes a failed outcome for that one request and the loop
//! continues. Nothing ever terminates the worker besides stop or queue
//! close.

use std::sync::Arc;

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::fetch::{FetchDispatcher, FetchError, FetchOutcome, TileFetcher};

/// One fetch worker.
///
/// [`FetchWorker::start`] spawns the loop; it is safe to call while the loop
/// is running (no duplicate loop is spawned for one worker instance).
/// [`FetchWorker::stop`] has join semantics: once it returns, the loop has
/// exited and this worker will produce no further outcome reports.
pub struct FetchWorker {
    id: usize,
    dispatcher: Arc<dyn FetchDispatcher>,
    fetcher: Arc<dyn TileFetcher>,
    shutdown: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl FetchWorker {
    /// Creates a worker. The loop does not run until [`Self::start`].
    pub fn new(
        id: usize,
        dispatcher: Arc<dyn FetchDispatcher>,
        fetcher: Arc<dyn TileFetcher>,
    ) -> Self {
        Self {
            id,
            dispatcher,
            fetcher,
            shutdown: CancellationToken::new(),
            handle: None,
        }
    }

    /// Worker id, for logs.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Begins the worker loop. No-op while already running.
    pub fn start(&mut self) {
        if self.is_running() {
            debug!(worker_id = self.id, "start ignored, worker already running");
            return;
        }
        self.shutdown = CancellationToken::new();
        let dispatcher = Arc::clone(&self.dispatcher);
        let fetcher = Arc::clone(&self.fetcher);
        let shutdown = self.shutdown.clone();
        let id = self.id;
        self.handle = Some(tokio::spawn(run_loop(id, dispatcher, fetcher, shutdown)));
    }

    /// Whether the worker loop is currently running.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Signals the loop to exit at the next safe point without waiting.
    ///
    /// Used by the pool to fan the stop signal out before joining, so total
    /// stop latency is one in-flight fetch rather than one per worker.
    pub fn signal_stop(&self) {
        self.shutdown.cancel();
    }

    /// Stops the worker and waits for its loop to exit.
    ///
    /// After this returns, no `report_outcome` or cache write can originate
    /// from this worker; tearing down the cache is now safe. The worker may
    /// be started again afterwards.
    pub async fn stop(&mut self) {
        self.shutdown.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

async fn run_loop(
    id: usize,
    dispatcher: Arc<dyn FetchDispatcher>,
    fetcher: Arc<dyn TileFetcher>,
    shutdown: CancellationToken,
) {
    debug!(worker_id = id, "fetch worker started");
    loop {
        // Stop is only observed between requests; once a request is taken,
        // the fetch runs to completion.
        let request = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            request = dispatcher.take_next() => match request {
                Some(request) => request,
                None => break, // queue closed
            },
        };

        let key = request.key.clone();
        let outcome = match AssertUnwindSafe(fetcher.fetch(key.clone()))
            .catch_unwind()
            .await
        {
            Ok(Ok(bitmap)) => FetchOutcome::success(key, bitmap),
            Ok(Err(error)) => {
                debug!(worker_id = id, key_id = key.id(), %error, "fetch error");
                FetchOutcome::failure(key, error)
            }
            Err(_panic) => {
                warn!(
                    worker_id = id,
                    key_id = key.id(),
                    "panic escaped fetch path, reporting failed outcome"
                );
                FetchOutcome::failure(key, FetchError::Panicked)
            }
        };
        dispatcher.report_outcome(outcome).await;
    }
    debug!(worker_id = id, "fetch worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{BoxFuture, FetchRequest};
    use crate::resource::{Bitmap, ResourceKey};
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::time::Duration;
    use tiny_skia::Pixmap;

    /// Dispatcher over a fixed request list, recording outcomes.
    struct ScriptedDispatcher {
        queue: Mutex<VecDeque<FetchRequest>>,
        outcomes: Mutex<Vec<FetchOutcome>>,
        drained: CancellationToken,
    }

    impl ScriptedDispatcher {
        fn new(requests: Vec<FetchRequest>) -> Self {
            Self {
                queue: Mutex::new(requests.into()),
                outcomes: Mutex::new(Vec::new()),
                drained: CancellationToken::new(),
            }
        }

        fn outcome_count(&self) -> usize {
            self.outcomes.lock().len()
        }
    }

    impl FetchDispatcher for ScriptedDispatcher {
        fn take_next(&self) -> BoxFuture<'_, Option<FetchRequest>> {
            Box::pin(async move {
                let request = self.queue.lock().pop_front();
                if request.is_none() {
                    // Park until the test stops the worker.
                    self.drained.cancel();
                    futures::future::pending::<()>().await;
                }
                request
            })
        }

        fn report_outcome(&self, outcome: FetchOutcome) -> BoxFuture<'_, ()> {
            Box::pin(async move {
                self.outcomes.lock().push(outcome);
            })
        }
    }

    /// Fetcher that panics for keys labelled "panic" and succeeds otherwise.
    struct PanickyFetcher;

    impl TileFetcher for PanickyFetcher {
        fn fetch(&self, key: ResourceKey) -> BoxFuture<'_, Result<Bitmap, FetchError>> {
            Box::pin(async move {
                if key.label() == "panic" {
                    panic!("fetch blew up");
                }
                Ok(Bitmap::new(Pixmap::new(1, 1).unwrap()))
            })
        }
    }

    fn requests(labels: &[&str]) -> Vec<FetchRequest> {
        labels
            .iter()
            .map(|label| FetchRequest::on_demand(ResourceKey::new(*label)))
            .collect()
    }

    #[tokio::test]
    async fn test_worker_processes_all_requests() {
        let dispatcher = Arc::new(ScriptedDispatcher::new(requests(&["a", "b", "c"])));
        let mut worker = FetchWorker::new(0, dispatcher.clone(), Arc::new(PanickyFetcher));

        worker.start();
        tokio::time::timeout(Duration::from_secs(1), dispatcher.drained.cancelled())
            .await
            .unwrap();
        worker.stop().await;

        let outcomes = dispatcher.outcomes.lock();
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes.iter().all(|o| o.is_success()));
    }

    #[tokio::test]
    async fn test_panic_fails_one_request_not_the_worker() {
        // Request 5 of 10 panics; 6-10 must still be processed.
        let labels: Vec<String> = (1..=10)
            .map(|i| if i == 5 { "panic".into() } else { format!("r{i}") })
            .collect();
        let label_refs: Vec<&str> = labels.iter().map(String::as_str).collect();
        let dispatcher = Arc::new(ScriptedDispatcher::new(requests(&label_refs)));
        let mut worker = FetchWorker::new(0, dispatcher.clone(), Arc::new(PanickyFetcher));

        worker.start();
        tokio::time::timeout(Duration::from_secs(1), dispatcher.drained.cancelled())
            .await
            .unwrap();
        worker.stop().await;

        let outcomes = dispatcher.outcomes.lock();
        assert_eq!(outcomes.len(), 10);
        assert_eq!(outcomes.iter().filter(|o| o.is_success()).count(), 9);
        let failed = outcomes.iter().find(|o| !o.is_success()).unwrap();
        assert_eq!(failed.key.label(), "panic");
        assert_eq!(failed.result.clone().unwrap_err(), FetchError::Panicked);
    }

    #[tokio::test]
    async fn test_start_is_idempotent_while_running() {
        let dispatcher = Arc::new(ScriptedDispatcher::new(Vec::new()));
        let mut worker = FetchWorker::new(0, dispatcher.clone(), Arc::new(PanickyFetcher));

        worker.start();
        assert!(worker.is_running());
        worker.start();
        assert!(worker.is_running());

        worker.stop().await;
        assert!(!worker.is_running());
    }

    #[tokio::test]
    async fn test_no_outcomes_after_stop_returns() {
        let dispatcher = Arc::new(ScriptedDispatcher::new(requests(&["a", "b"])));
        let mut worker = FetchWorker::new(0, dispatcher.clone(), Arc::new(PanickyFetcher));

        worker.start();
        tokio::time::timeout(Duration::from_secs(1), dispatcher.drained.cancelled())
            .await
            .unwrap();
        worker.stop().await;

        let count = dispatcher.outcome_count();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(dispatcher.outcome_count(), count);
    }

    #[tokio::test]
    async fn test_worker_restarts_after_stop() {
        let dispatcher = Arc::new(ScriptedDispatcher::new(requests(&["a"])));
        let mut worker = FetchWorker::new(0, dispatcher.clone(), Arc::new(PanickyFetcher));

        worker.start();
        tokio::time::timeout(Duration::from_secs(1), dispatcher.drained.cancelled())
            .await
            .unwrap();
        worker.stop().await;
        assert_eq!(dispatcher.outcome_count(), 1);

        dispatcher
            .queue
            .lock()
            .push_back(FetchRequest::on_demand(ResourceKey::new("b")));
        worker.start();
        assert!(worker.is_running());

        // Poll until the restarted loop drains the new request.
        for _ in 0..100 {
            if dispatcher.outcome_count() == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(dispatcher.outcome_count(), 2);
        worker.stop().await;
    }
}
