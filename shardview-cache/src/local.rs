use std::{
    collections::HashMap,
    sync::RwLock,
    time::{Duration, Instant},
};

#[derive(Debug, Clone)]
struct Entry<V: Clone> {
    value: V,
    deadline: Instant,
}

// -----------------
// LocalCache
// -----------------
/// In-process cache with a per-entry TTL, for extremely hot, small values
/// that would otherwise cost a remote round trip on every read.
/// Expired entries are dropped lazily on access.
#[derive(Debug, Default)]
pub struct LocalCache<V: Clone> {
    map: RwLock<HashMap<String, Entry<V>>>,
}

impl<V: Clone> LocalCache<V> {
    pub fn new() -> Self {
        Self {
            map: RwLock::default(),
        }
    }

    /// Returns the value for `key` if present and unexpired. An expired
    /// entry is removed on the way out.
    pub fn get(&self, key: &str) -> Option<V> {
        let expired = {
            let map = self.map.read().expect("RwLock poisoned");
            match map.get(key) {
                Some(entry) if entry.deadline > Instant::now() => {
                    return Some(entry.value.clone());
                }
                Some(_) => true,
                None => false,
            }
        };
        if expired {
            self.map.write().expect("RwLock poisoned").remove(key);
        }
        None
    }

    pub fn set(&self, key: &str, value: V, ttl: Duration) {
        let entry = Entry {
            value,
            deadline: Instant::now() + ttl,
        };
        self.map
            .write()
            .expect("RwLock poisoned")
            .insert(key.to_string(), entry);
    }

    pub fn delete(&self, key: &str) -> bool {
        self.map
            .write()
            .expect("RwLock poisoned")
            .remove(key)
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.map.read().expect("RwLock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every expired entry. Callers with long-lived instances can
    /// run this periodically to keep the map from accumulating dead keys.
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.map
            .write()
            .expect("RwLock poisoned")
            .retain(|_, entry| entry.deadline > now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_returns_unexpired_values() {
        let cache = LocalCache::new();
        cache.set("a", 1u32, Duration::from_secs(60));
        assert_eq!(cache.get("a"), Some(1));
        assert_eq!(cache.get("b"), None);
    }

    #[test]
    fn expired_entries_are_dropped_on_access() {
        let cache = LocalCache::new();
        cache.set("a", 1u32, Duration::from_millis(10));
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(cache.get("a"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn set_overwrites_and_extends_deadline() {
        let cache = LocalCache::new();
        cache.set("a", 1u32, Duration::from_millis(10));
        cache.set("a", 2u32, Duration::from_secs(60));
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(cache.get("a"), Some(2));
    }

    #[test]
    fn purge_expired_retains_live_entries() {
        let cache = LocalCache::new();
        cache.set("dead", 1u32, Duration::from_millis(5));
        cache.set("live", 2u32, Duration::from_secs(60));
        std::thread::sleep(Duration::from_millis(10));
        cache.purge_expired();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("live"), Some(2));
    }
}
