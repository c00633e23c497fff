//! Fetch dispatcher: the work queue between render-time misses and the
//! worker pool.
//!
//! [`FetchDispatcher`] is the shape workers depend on; [`RequestSink`] is the
//! narrow submission surface the render pass depends on. The concrete
//! [`TileFetchDispatcher`] backs both with a bounded channel, deduplicates
//! in-flight keys, and lands successful outcomes directly in the shared
//! [`ResourceCache`].
//!
//! Stop is a closeable-queue affair, not thread interruption: after
//! [`TileFetchDispatcher::close`], every pending and future `take_next`
//! resolves to `None` and workers drain out of their loops.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashSet;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::fetch::{FetchOutcome, FetchRequest};
use crate::resource::ResourceCache;

/// Boxed future used by the object-safe async traits in this module.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Thread-safe source of pending fetch requests and sink for their outcomes.
///
/// This is the only shape [`FetchWorker`] depends on; request-prioritization
/// policy lives entirely behind it.
///
/// [`FetchWorker`]: crate::fetch::FetchWorker
pub trait FetchDispatcher: Send + Sync {
    /// Waits for the next request.
    ///
    /// Resolves to `None` once the dispatcher is closed; workers treat that
    /// as "drain out of the loop".
    fn take_next(&self) -> BoxFuture<'_, Option<FetchRequest>>;

    /// Reports the outcome of a completed fetch.
    fn report_outcome(&self, outcome: FetchOutcome) -> BoxFuture<'_, ()>;
}

/// Non-blocking request submission, used from the render pass on cache
/// misses. The render thread never waits on the fetch side.
pub trait RequestSink: Send + Sync {
    /// Enqueues a request. Returns false if it was dropped (queue full or
    /// closed) or the key is already in flight.
    fn enqueue(&self, request: FetchRequest) -> bool;
}

/// Channel-backed dispatcher feeding the worker pool and writing successful
/// outcomes into the bitmap cache.
pub struct TileFetchDispatcher {
    request_tx: mpsc::Sender<FetchRequest>,
    request_rx: tokio::sync::Mutex<mpsc::Receiver<FetchRequest>>,
    in_flight: DashSet<u64>,
    cache: Arc<ResourceCache>,
    closed: CancellationToken,
    redraw: Arc<Notify>,
    dropped: AtomicU64,
}

impl TileFetchDispatcher {
    /// Creates a dispatcher over the given cache with a bounded queue.
    pub fn new(cache: Arc<ResourceCache>, queue_capacity: usize) -> Self {
        let (request_tx, request_rx) = mpsc::channel(queue_capacity);
        Self {
            request_tx,
            request_rx: tokio::sync::Mutex::new(request_rx),
            in_flight: DashSet::new(),
            cache,
            closed: CancellationToken::new(),
            redraw: Arc::new(Notify::new()),
            dropped: AtomicU64::new(0),
        }
    }

    /// Closes the queue. Pending and future `take_next` calls resolve to
    /// `None`; queued-but-unstarted requests are never picked up.
    pub fn close(&self) {
        self.closed.cancel();
    }

    /// Whether [`Self::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Notified each time a fetched bitmap lands in the cache, so a host can
    /// schedule a redraw instead of polling.
    pub fn redraw_notify(&self) -> Arc<Notify> {
        Arc::clone(&self.redraw)
    }

    /// Number of keys currently being fetched or queued.
    pub fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }

    /// Requests dropped because the queue was full or closed.
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl RequestSink for TileFetchDispatcher {
    fn enqueue(&self, request: FetchRequest) -> bool {
        if self.closed.is_cancelled() {
            return false;
        }
        // One in-flight fetch per key identity; repeated misses across
        // passes collapse into it.
        if !self.in_flight.insert(request.key.id()) {
            return false;
        }
        match self.request_tx.try_send(request) {
            Ok(()) => true,
            Err(TrySendError::Full(request)) | Err(TrySendError::Closed(request)) => {
                self.in_flight.remove(&request.key.id());
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(key_id = request.key.id(), "fetch queue full, request dropped");
                false
            }
        }
    }
}

impl FetchDispatcher for TileFetchDispatcher {
    fn take_next(&self) -> BoxFuture<'_, Option<FetchRequest>> {
        Box::pin(async move {
            let mut request_rx = self.request_rx.lock().await;
            tokio::select! {
                biased;
                _ = self.closed.cancelled() => None,
                request = request_rx.recv() => request,
            }
        })
    }

    fn report_outcome(&self, outcome: FetchOutcome) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            self.in_flight.remove(&outcome.key.id());
            match outcome.result {
                Ok(bitmap) => {
                    self.cache.put(outcome.key, bitmap);
                    self.redraw.notify_waiters();
                }
                Err(error) => {
                    // Isolated to this request; a later pass may re-enqueue.
                    debug!(key_id = outcome.key.id(), %error, "fetch failed");
                }
            }
        })
    }
}
