//! Fetch request and outcome value types.

use crate::fetch::FetchError;
use crate::resource::{Bitmap, ResourceKey};

/// Request scheduling priority (higher = more important).
///
/// Carried as metadata on the request; how (or whether) a dispatcher orders
/// by it is the dispatcher's policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority(i32);

impl Priority {
    /// A resource the current pass is missing.
    pub const ON_DEMAND: Priority = Priority(100);

    /// Speculative background work.
    pub const PREFETCH: Priority = Priority(0);

    /// Creates a custom priority level.
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    /// Raw priority value.
    pub const fn value(&self) -> i32 {
        self.0
    }
}

/// "Fetch and decode the resource behind this key."
#[derive(Clone, Debug)]
pub struct FetchRequest {
    /// Cache slot the decoded bitmap is destined for.
    pub key: ResourceKey,
    /// Scheduling metadata.
    pub priority: Priority,
}

impl FetchRequest {
    /// Creates a request with an explicit priority.
    pub fn new(key: ResourceKey, priority: Priority) -> Self {
        Self { key, priority }
    }

    /// A request for a resource the current pass needs.
    pub fn on_demand(key: ResourceKey) -> Self {
        Self::new(key, Priority::ON_DEMAND)
    }

    /// A speculative request.
    pub fn prefetch(key: ResourceKey) -> Self {
        Self::new(key, Priority::PREFETCH)
    }
}

/// The decoded bitmap (or failure) for one fetch request.
#[derive(Clone, Debug)]
pub struct FetchOutcome {
    /// Key the request was made for.
    pub key: ResourceKey,
    /// Decoded bitmap, or why there isn't one.
    pub result: Result<Bitmap, FetchError>,
}

impl FetchOutcome {
    /// A successful fetch+decode.
    pub fn success(key: ResourceKey, bitmap: Bitmap) -> Self {
        Self {
            key,
            result: Ok(bitmap),
        }
    }

    /// A failed fetch+decode.
    pub fn failure(key: ResourceKey, error: FetchError) -> Self {
        Self {
            key,
            result: Err(error),
        }
    }

    /// Whether the fetch produced a bitmap.
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}
