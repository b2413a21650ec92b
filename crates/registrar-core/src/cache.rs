//! In-process cache of the latest projection per stream.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A cached projection together with the position it reflects.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedProjection<A> {
    /// Number of events folded into `state`.
    pub version: i64,
    /// Creation timestamp of the last folded event.
    pub last_event_at: DateTime<Utc>,
    /// The materialized state.
    pub state: A,
}

/// Latest materialized state per stream.
///
/// Entries are replaced wholesale and never move backwards: a `put` carrying
/// an older version than the cached one is discarded.
#[derive(Debug)]
pub struct ProjectionCache<A> {
    entries: RwLock<HashMap<Uuid, CachedProjection<A>>>,
}

impl<A> Default for ProjectionCache<A> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<A: Clone> ProjectionCache<A> {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the cached entry for `stream_id`.
    #[must_use]
    pub fn get(&self, stream_id: Uuid) -> Option<CachedProjection<A>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&stream_id)
            .cloned()
    }

    /// Stores `entry` unless a newer version is already cached.
    pub fn put(&self, stream_id: Uuid, entry: CachedProjection<A>) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        match entries.get(&stream_id) {
            Some(existing) if existing.version > entry.version => {}
            _ => {
                entries.insert(stream_id, entry);
            }
        }
    }

    /// Drops the entry for `stream_id`.
    pub fn invalidate(&self, stream_id: Uuid) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&stream_id);
    }

    /// Number of cached streams.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;

    fn entry(version: i64, state: &str) -> CachedProjection<String> {
        CachedProjection {
            version,
            last_event_at: Utc::now(),
            state: state.to_owned(),
        }
    }

    #[test]
    fn test_put_then_get_returns_entry() {
        let cache = ProjectionCache::new();
        let stream_id = Uuid::new_v4();

        cache.put(stream_id, entry(1, "first"));

        assert_eq!(cache.get(stream_id).map(|e| e.state), Some("first".to_owned()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_put_replaces_entry_wholesale() {
        let cache = ProjectionCache::new();
        let stream_id = Uuid::new_v4();

        cache.put(stream_id, entry(1, "first"));
        cache.put(stream_id, entry(2, "second"));

        let cached = cache.get(stream_id).unwrap();
        assert_eq!(cached.version, 2);
        assert_eq!(cached.state, "second");
    }

    #[test]
    fn test_put_ignores_older_version() {
        let cache = ProjectionCache::new();
        let stream_id = Uuid::new_v4();

        cache.put(stream_id, entry(3, "newer"));
        cache.put(stream_id, entry(2, "older"));

        assert_eq!(cache.get(stream_id).unwrap().state, "newer");
    }

    #[test]
    fn test_invalidate_removes_entry() {
        let cache = ProjectionCache::new();
        let stream_id = Uuid::new_v4();
        cache.put(stream_id, entry(1, "first"));

        cache.invalidate(stream_id);

        assert!(cache.get(stream_id).is_none());
        assert!(cache.is_empty());
    }
}
