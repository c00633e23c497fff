//! Identity-based resource keys.
//!
//! A [`ResourceKey`] addresses one slot in the [`ResourceCache`]. Keys compare
//! and hash by the identity of their inner allocation, never by value: two
//! keys created from the same label are two distinct cache slots. This is
//! deliberate: a tile, a symbol, or a style+feature pairing each get their
//! own key object, and the cache is per-identity, not per-value.
//!
//! [`ResourceCache`]: crate::resource::ResourceCache

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Opaque identity token addressing a cached decoded bitmap.
///
/// Cloning is cheap (shared inner allocation) and clones compare equal to
/// the original. The label carries whatever the fetch source needs to
/// resolve the content (for HTTP-backed tiles it is the request URL); the
/// cache itself never interprets it.
#[derive(Clone)]
pub struct ResourceKey(Arc<KeyInner>);

struct KeyInner {
    label: String,
}

impl ResourceKey {
    /// Creates a new key with its own identity.
    ///
    /// Calling this twice with the same label yields two distinct keys.
    pub fn new(label: impl Into<String>) -> Self {
        Self(Arc::new(KeyInner {
            label: label.into(),
        }))
    }

    /// Returns the key's label.
    pub fn label(&self) -> &str {
        &self.0.label
    }

    /// Returns a stable numeric identity for this key.
    ///
    /// Derived from the inner allocation's address; stable for the key's
    /// lifetime and shared by all clones. Used for logging and in-flight
    /// request deduplication.
    pub fn id(&self) -> u64 {
        Arc::as_ptr(&self.0) as u64
    }
}

impl PartialEq for ResourceKey {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for ResourceKey {}

impl Hash for ResourceKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.0) as usize).hash(state);
    }
}

impl fmt::Debug for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceKey")
            .field("id", &self.id())
            .field("label", &self.0.label)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_clones_share_identity() {
        let key = ResourceKey::new("tile/12/100/200");
        let clone = key.clone();

        assert_eq!(key, clone);
        assert_eq!(key.id(), clone.id());
    }

    #[test]
    fn test_equal_labels_distinct_identities() {
        let a = ResourceKey::new("tile/12/100/200");
        let b = ResourceKey::new("tile/12/100/200");

        assert_eq!(a.label(), b.label());
        assert_ne!(a, b);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_hash_follows_identity() {
        let a = ResourceKey::new("same");
        let b = ResourceKey::new("same");

        let mut set = HashSet::new();
        set.insert(a.clone());
        set.insert(a.clone());
        set.insert(b);

        assert_eq!(set.len(), 2);
        assert!(set.contains(&a));
    }

    #[test]
    fn test_label_accessor() {
        let key = ResourceKey::new("symbol/airport");
        assert_eq!(key.label(), "symbol/airport");
    }
}
