//! Renderer configuration.
//!
//! Plain data types with serde support so a host application can load them
//! from its own settings file. Defaults carry the production constants.

use serde::{Deserialize, Serialize};

use crate::fetch::DEFAULT_WORKER_COUNT;
use crate::resource::{DEFAULT_KEEP_MULTIPLIER, DEFAULT_MIN_KEEP};

/// Default bound on queued-but-unstarted fetch requests.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Default HTTP timeout for tile downloads (seconds).
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Eviction policy knobs for the bitmap cache.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Entry count below which the sweep never evicts.
    pub min_keep: usize,

    /// Multiplier applied to the pass's working set to size the cache.
    pub keep_multiplier: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            min_keep: DEFAULT_MIN_KEEP,
            keep_multiplier: DEFAULT_KEEP_MULTIPLIER,
        }
    }
}

/// Fetch pool and dispatcher knobs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Number of fetch workers. Fixed at pool construction.
    pub workers: usize,

    /// Capacity of the pending-request queue.
    pub queue_capacity: usize,

    /// Timeout for one HTTP tile download, in seconds.
    pub http_timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKER_COUNT,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

/// Top-level configuration combining all component configs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Bitmap cache configuration.
    pub cache: CacheConfig,

    /// Fetch pool configuration.
    pub fetch: FetchConfig,
}
