//! Iteration-aged bitmap cache.
//!
//! The [`ResourceCache`] maps identity keys to decoded bitmaps and bounds its
//! size with an eviction sweep keyed on "last render iteration used" rather
//! than per-access timestamps. Iteration numbers have far fewer distinct
//! values than timestamps, so the once-per-pass sort stays cheap even under
//! high read rates.
//!
//! # Per-pass protocol
//!
//! The render thread drives the cache in a fixed order each pass:
//!
//! 1. `try_get` / `put` while drawing
//! 2. [`ResourceCache::evict_unused`] — measures the pass just finished
//! 3. [`ResourceCache::advance_iteration`]
//!
//! Evicting before advancing is load-bearing: the sweep counts entries whose
//! `last_iteration_used` equals the current iteration, which only reflects
//! the finished pass while the counter has not yet moved.
//!
//! # Thread-safety
//!
//! `try_get` and `put` may be called concurrently from the render thread and
//! fetch-completion callbacks; the map is mutex-guarded and every mutation is
//! a single locked operation. The sweep and the counter advance belong to the
//! render thread alone, once per pass.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::trace;

use crate::config::CacheConfig;
use crate::resource::{Bitmap, BitmapResource, ResourceKey};

/// Default floor below which the sweep never evicts.
pub const DEFAULT_MIN_KEEP: usize = 32;

/// Default multiplier applied to the pass's working set to size the cache.
pub const DEFAULT_KEEP_MULTIPLIER: usize = 3;

/// One cached entry.
///
/// `sequence` captures insertion order and pins the eviction tie-break for
/// entries sharing the same `last_iteration_used`.
struct Entry {
    image: Bitmap,
    last_iteration_used: u64,
    sequence: u64,
}

/// Snapshot of cache counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups that found an entry.
    pub hits: u64,
    /// Lookups that found nothing.
    pub misses: u64,
    /// Inserts and replacements.
    pub insertions: u64,
    /// Entries removed by eviction sweeps.
    pub evictions: u64,
    /// Current number of entries.
    pub entry_count: usize,
}

/// Identity-keyed cache of decoded bitmaps, aged by render iteration.
pub struct ResourceCache {
    entries: Mutex<HashMap<ResourceKey, Entry>>,
    current_iteration: AtomicU64,
    next_sequence: AtomicU64,
    min_keep: usize,
    keep_multiplier: usize,
    hits: AtomicU64,
    misses: AtomicU64,
    insertions: AtomicU64,
    evictions: AtomicU64,
}

impl ResourceCache {
    /// Creates a cache with the default eviction policy
    /// (keep at least 32 entries, keep 3x the current working set).
    pub fn new() -> Self {
        Self::with_config(&CacheConfig::default())
    }

    /// Creates a cache with an explicit eviction policy.
    pub fn with_config(config: &CacheConfig) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            current_iteration: AtomicU64::new(0),
            next_sequence: AtomicU64::new(0),
            min_keep: config.min_keep,
            keep_multiplier: config.keep_multiplier,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            insertions: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Looks up a key.
    ///
    /// On a hit the entry's `last_iteration_used` is bumped to the current
    /// iteration and a shared handle to the image is returned. A miss has no
    /// side effect beyond the miss counter.
    pub fn try_get(&self, key: &ResourceKey) -> Option<BitmapResource> {
        let iteration = self.current_iteration.load(Ordering::Acquire);
        let mut entries = self.entries.lock();
        match entries.get_mut(key) {
            Some(entry) => {
                entry.last_iteration_used = iteration;
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(BitmapResource {
                    image: entry.image.clone(),
                    last_iteration_used: iteration,
                })
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Inserts or replaces the entry for `key`.
    ///
    /// The entry starts with `last_iteration_used` set to the current
    /// iteration. Replacing an existing entry drops the prior image handle,
    /// so a superseded bitmap is released as soon as no draw call holds it.
    pub fn put(&self, key: ResourceKey, image: Bitmap) {
        let iteration = self.current_iteration.load(Ordering::Acquire);
        let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed);
        let mut entries = self.entries.lock();
        entries.insert(
            key,
            Entry {
                image,
                last_iteration_used: iteration,
                sequence,
            },
        );
        self.insertions.fetch_add(1, Ordering::Relaxed);
    }

    /// Advances the render iteration counter by exactly one.
    ///
    /// Called once per completed render pass, after [`Self::evict_unused`].
    pub fn advance_iteration(&self) {
        self.current_iteration.fetch_add(1, Ordering::AcqRel);
    }

    /// Current render iteration.
    pub fn current_iteration(&self) -> u64 {
        self.current_iteration.load(Ordering::Acquire)
    }

    /// Removes the least-recently-used entries beyond the size bound.
    ///
    /// With `used` = entries touched in the pass just finished, the cache
    /// keeps `max(min_keep, used * keep_multiplier)` entries and removes the
    /// excess, oldest `last_iteration_used` first, insertion order breaking
    /// ties. Entries used this pass are never removed (the bound always
    /// covers them). Returns the number of entries removed.
    pub fn evict_unused(&self) -> usize {
        let iteration = self.current_iteration.load(Ordering::Acquire);
        let mut entries = self.entries.lock();

        let used = entries
            .values()
            .filter(|e| e.last_iteration_used == iteration)
            .count();
        let keep = (used * self.keep_multiplier).max(self.min_keep);
        if entries.len() <= keep {
            return 0;
        }
        let to_remove = entries.len() - keep;

        let mut candidates: Vec<(ResourceKey, u64, u64)> = entries
            .iter()
            .map(|(key, entry)| (key.clone(), entry.last_iteration_used, entry.sequence))
            .collect();
        candidates.sort_by_key(|&(_, last_used, sequence)| (last_used, sequence));

        let mut removed = 0;
        for (key, last_used, _) in candidates.into_iter().take(to_remove) {
            entries.remove(&key);
            trace!(key_id = key.id(), last_used, "evicted bitmap");
            removed += 1;
        }

        self.evictions.fetch_add(removed as u64, Ordering::Relaxed);
        removed
    }

    /// Number of entries touched in the current iteration.
    pub fn used_this_iteration(&self) -> usize {
        let iteration = self.current_iteration.load(Ordering::Acquire);
        self.entries
            .lock()
            .values()
            .filter(|e| e.last_iteration_used == iteration)
            .count()
    }

    /// Current number of entries.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true when the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Drops every entry. Used at teardown, after fetch workers have stopped.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Snapshot of the cache counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            insertions: self.insertions.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entry_count: self.len(),
        }
    }
}

impl Default for ResourceCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ResourceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceCache")
            .field("entries", &self.len())
            .field("current_iteration", &self.current_iteration())
            .field("min_keep", &self.min_keep)
            .field("keep_multiplier", &self.keep_multiplier)
            .finish()
    }
}
