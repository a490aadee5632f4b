use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::errors::CacheResult;

// -----------------
// RemoteCache
// -----------------
/// A shared key/value store with per-key TTL, visible across process
/// instances. Values are opaque byte strings; the orchestrator owns
/// (de)serialization.
#[async_trait]
pub trait RemoteCache: Send + Sync + 'static {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;

    /// Batched get preserving key order; `None` for missing or expired keys.
    async fn get_many(&self, keys: &[String]) -> CacheResult<Vec<Option<Vec<u8>>>> {
        let mut values = Vec::with_capacity(keys.len());
        for key in keys {
            values.push(self.get(key).await?);
        }
        Ok(values)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> CacheResult<()>;

    async fn set_many(&self, entries: Vec<(String, Vec<u8>)>, ttl: Duration) -> CacheResult<()> {
        for (key, value) in entries {
            self.set(&key, value, ttl).await?;
        }
        Ok(())
    }

    /// Returns true when the key existed.
    async fn delete(&self, key: &str) -> CacheResult<bool>;
}

// -----------------
// InMemoryRemoteCache
// -----------------
/// [RemoteCache] backed by a process-local map. Serves single-instance
/// deployments and tests; multi-instance deployments plug in a store that
/// is actually shared.
#[derive(Debug, Default)]
pub struct InMemoryRemoteCache {
    map: RwLock<HashMap<String, (Vec<u8>, Instant)>>,
}

impl InMemoryRemoteCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RemoteCache for InMemoryRemoteCache {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let expired = {
            let map = self.map.read().await;
            match map.get(key) {
                Some((value, deadline)) if *deadline > Instant::now() => {
                    return Ok(Some(value.clone()));
                }
                Some(_) => true,
                None => false,
            }
        };
        if expired {
            self.map.write().await.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> CacheResult<()> {
        self.map
            .write()
            .await
            .insert(key.to_string(), (value, Instant::now() + ttl));
        Ok(())
    }

    async fn set_many(&self, entries: Vec<(String, Vec<u8>)>, ttl: Duration) -> CacheResult<()> {
        let deadline = Instant::now() + ttl;
        let mut map = self.map.write().await;
        for (key, value) in entries {
            map.insert(key, (value, deadline));
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        Ok(self.map.write().await.remove(key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_get_delete() {
        let cache = InMemoryRemoteCache::new();
        cache
            .set("a", b"1".to_vec(), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(cache.get("a").await.unwrap(), Some(b"1".to_vec()));
        assert!(cache.delete("a").await.unwrap());
        assert!(!cache.delete("a").await.unwrap());
        assert_eq!(cache.get("a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn entries_expire_by_ttl() {
        let cache = InMemoryRemoteCache::new();
        cache
            .set("a", b"1".to_vec(), Duration::from_millis(10))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(cache.get("a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn get_many_preserves_key_order() {
        let cache = InMemoryRemoteCache::new();
        cache
            .set("b", b"2".to_vec(), Duration::from_secs(60))
            .await
            .unwrap();
        let values = cache
            .get_many(&["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        assert_eq!(values, vec![None, Some(b"2".to_vec())]);
    }
}
