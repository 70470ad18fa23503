//! Route state cache.
//!
//! An in-memory map from `(route, fast-only)` to the most recently
//! computed `RouteState`, shared between the poller (writer) and any
//! number of display consumers (readers). Every operation is a short
//! critical section around the map; nothing is held across I/O.
//!
//! There is no TTL: entries are overwritten each poll cycle and the map
//! is cleared wholesale only when the fast-only mode toggles, so the old
//! key namespace cannot serve stale data.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::domain::{CacheKey, RouteState};

/// Concurrency-safe cache of the latest state per route and filter mode.
#[derive(Debug, Default)]
pub struct RouteCache {
    states: Mutex<HashMap<CacheKey, RouteState>>,
}

impl RouteCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, RouteState>> {
        // A poisoned map is still just the last written states
        self.states.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Latest state for a key, if any cycle has produced one.
    pub fn get(&self, key: &CacheKey) -> Option<RouteState> {
        self.lock().get(key).cloned()
    }

    /// Replace the state for a key.
    pub fn update(&self, key: CacheKey, state: RouteState) {
        self.lock().insert(key, state);
    }

    /// Drop every entry. Used only on an explicit filter-mode toggle.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of cached entries (for monitoring).
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RouteId;

    fn key(id: &str, fast_only: bool) -> CacheKey {
        (RouteId::new(id), fast_only)
    }

    #[test]
    fn starts_empty() {
        let cache = RouteCache::new();
        assert!(cache.is_empty());
        assert!(cache.get(&key("route_a", false)).is_none());
    }

    #[test]
    fn update_then_get() {
        let cache = RouteCache::new();
        let state = RouteState::loading("SAC → ZFD");
        cache.update(key("route_a", false), state.clone());

        assert_eq!(cache.get(&key("route_a", false)), Some(state));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn updates_overwrite() {
        let cache = RouteCache::new();
        cache.update(key("route_a", false), RouteState::loading("SAC → ZFD"));
        cache.update(
            key("route_a", false),
            RouteState::message("SAC → ZFD", "No matching services found."),
        );

        let state = cache.get(&key("route_a", false)).unwrap();
        assert_eq!(state.empty_message, "No matching services found.");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn filter_mode_is_part_of_the_key() {
        let cache = RouteCache::new();
        cache.update(key("route_a", false), RouteState::loading("all"));
        cache.update(key("route_a", true), RouteState::loading("fast"));

        assert_eq!(cache.get(&key("route_a", false)).unwrap().title, "all");
        assert_eq!(cache.get(&key("route_a", true)).unwrap().title, "fast");
    }

    #[test]
    fn clear_drops_everything() {
        let cache = RouteCache::new();
        cache.update(key("route_a", false), RouteState::loading("a"));
        cache.update(key("route_b", false), RouteState::loading("b"));

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn shared_across_threads() {
        use std::sync::Arc;

        let cache = Arc::new(RouteCache::new());
        let mut handles = Vec::new();

        for i in 0..8 {
            let cache = Arc::clone(&cache);
            handles.push(std::thread::spawn(move || {
                let id = format!("route_{i}");
                cache.update(key(&id, false), RouteState::loading(&id));
                cache.get(&key(&id, false)).is_some()
            }));
        }

        for handle in handles {
            assert!(handle.join().unwrap());
        }
        assert_eq!(cache.len(), 8);
    }
}
