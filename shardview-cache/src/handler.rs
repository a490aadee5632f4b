use std::{
    collections::HashMap,
    fmt::Display,
    future::Future,
    sync::{Arc, Mutex},
    time::Duration,
};

use log::*;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::oneshot;

use crate::{
    errors::{CacheError, CacheResult},
    local::LocalCache,
    remote::RemoteCache,
};

/// Cap on how long a remote value may be mirrored in the local tier. The
/// local tier only exists to absorb hot re-reads between remote round trips.
const LOCAL_MIRROR_TTL_CAP: Duration = Duration::from_secs(5);

type Waiters = Vec<oneshot::Sender<Result<Vec<u8>, CacheError>>>;
type InFlight = Mutex<HashMap<String, Waiters>>;

/// Cleans up after the computing caller. On normal completion
/// [Self::finish] hands back the parked waiters; if the computing future is
/// dropped first (caller timeout, task abort), the drop impl clears the
/// in-flight entry and fails the waiters with [CacheError::InFlightDropped],
/// so the next caller recomputes instead of parking behind a computation
/// that no longer exists.
struct InFlightGuard<'a> {
    in_flight: &'a InFlight,
    key: &'a str,
    disarmed: bool,
}

impl InFlightGuard<'_> {
    fn finish(mut self) -> Waiters {
        self.disarmed = true;
        self.in_flight
            .lock()
            .expect("in_flight lock poisoned")
            .remove(self.key)
            .unwrap_or_default()
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if self.disarmed {
            return;
        }
        let waiters = self
            .in_flight
            .lock()
            .expect("in_flight lock poisoned")
            .remove(self.key)
            .unwrap_or_default();
        for tx in waiters {
            let _ = tx.send(Err(CacheError::InFlightDropped(self.key.to_string())));
        }
    }
}

// -----------------
// CacheHandler
// -----------------
/// Two-tier cache orchestrator: a short-TTL local tier in front of the
/// shared remote store, behind a uniform get-or-compute-and-store contract.
///
/// At most one computation per key is in flight at any time; concurrent
/// callers for the same key wait on the first caller's result. A failed
/// computation leaves the cache untouched and the next caller retries.
pub struct CacheHandler {
    local: LocalCache<Vec<u8>>,
    remote: Arc<dyn RemoteCache>,
    in_flight: InFlight,
}

impl CacheHandler {
    pub fn new(remote: Arc<dyn RemoteCache>) -> Self {
        Self {
            local: LocalCache::new(),
            remote,
            in_flight: InFlight::default(),
        }
    }

    /// Returns the cached value for `key` if present and unexpired in either
    /// tier; otherwise invokes `compute` exactly once per key even under
    /// concurrent callers, stores the result with the given TTL and returns
    /// it.
    pub async fn get_or_set<T, E, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        compute: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<CacheError> + Display,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(bytes) = self.local.get(key) {
            return deserialize(key, &bytes).map_err(E::from);
        }
        if let Some(bytes) = self.remote.get(key).await.map_err(E::from)? {
            self.local.set(key, bytes.clone(), mirror_ttl(ttl));
            return deserialize(key, &bytes).map_err(E::from);
        }

        // First caller for this key computes, everyone else parks a waiter.
        let waiter = {
            let mut in_flight =
                self.in_flight.lock().expect("in_flight lock poisoned");
            if let Some(waiters) = in_flight.get_mut(key) {
                let (tx, rx) = oneshot::channel();
                waiters.push(tx);
                Some(rx)
            } else {
                in_flight.insert(key.to_string(), Waiters::default());
                None
            }
        };

        if let Some(rx) = waiter {
            trace!("Waiting on in-flight computation for '{key}'");
            return match rx.await {
                Ok(Ok(bytes)) => deserialize(key, &bytes).map_err(E::from),
                Ok(Err(err)) => Err(E::from(err)),
                Err(_) => {
                    Err(E::from(CacheError::InFlightDropped(key.to_string())))
                }
            };
        }

        let guard = InFlightGuard {
            in_flight: &self.in_flight,
            key,
            disarmed: false,
        };

        debug!("Cache miss for '{key}', computing");
        let outcome = compute().await;
        let handoff = match &outcome {
            Ok(value) => serialize(key, value),
            Err(err) => {
                Err(CacheError::Compute(key.to_string(), err.to_string()))
            }
        };

        if let Ok(bytes) = &handoff {
            if let Err(err) = self.remote.set(key, bytes.clone(), ttl).await {
                warn!("Failed to store '{key}' in remote cache: {err}");
            }
            self.local.set(key, bytes.clone(), mirror_ttl(ttl));
        }

        for tx in guard.finish() {
            let _ = tx.send(handoff.clone());
        }

        match outcome {
            Ok(value) => match handoff {
                Ok(_) => Ok(value),
                Err(err) => Err(E::from(err)),
            },
            Err(err) => Err(err),
        }
    }

    /// Local-tier-only variant of [Self::get_or_set], for values that are
    /// re-read so often that even the remote store is too far away. No
    /// cross-caller de-duplication; a duplicate computation is cheaper than
    /// the coordination.
    pub async fn get_or_set_local<T, E, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        compute: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<CacheError> + Display,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(bytes) = self.local.get(key) {
            return deserialize(key, &bytes).map_err(E::from);
        }
        let value = compute().await?;
        let bytes = serialize(key, &value).map_err(E::from)?;
        self.local.set(key, bytes, ttl);
        Ok(value)
    }

    /// For a collection of items, resolves from the remote cache whichever
    /// keys already exist and computes only the missing ones in a single
    /// `compute` invocation, preserving input order in the result.
    pub async fn batch_process<I, T, E, K, F, Fut>(
        &self,
        items: &[I],
        key_of: K,
        ttl: Duration,
        compute: F,
    ) -> Result<Vec<T>, E>
    where
        I: Clone,
        T: Serialize + DeserializeOwned,
        E: From<CacheError> + Display,
        K: Fn(&I) -> String,
        F: FnOnce(Vec<I>) -> Fut,
        Fut: Future<Output = Result<Vec<T>, E>>,
    {
        if items.is_empty() {
            return Ok(vec![]);
        }

        let keys: Vec<String> = items.iter().map(&key_of).collect();
        let cached = self.remote.get_many(&keys).await.map_err(E::from)?;

        let mut resolved: Vec<Option<T>> = Vec::with_capacity(items.len());
        let mut missing_idx: Vec<usize> = vec![];
        for (idx, bytes) in cached.into_iter().enumerate() {
            match bytes {
                Some(bytes) => resolved
                    .push(Some(deserialize(&keys[idx], &bytes).map_err(E::from)?)),
                None => {
                    resolved.push(None);
                    missing_idx.push(idx);
                }
            }
        }

        if !missing_idx.is_empty() {
            let missing_items: Vec<I> = missing_idx
                .iter()
                .map(|&idx| items[idx].clone())
                .collect();
            let computed = compute(missing_items).await?;
            if computed.len() != missing_idx.len() {
                return Err(E::from(CacheError::BatchLengthMismatch {
                    expected: missing_idx.len(),
                    got: computed.len(),
                }));
            }

            let mut entries = Vec::with_capacity(computed.len());
            for (&idx, value) in missing_idx.iter().zip(computed) {
                entries
                    .push((keys[idx].clone(), serialize(&keys[idx], &value).map_err(E::from)?));
                resolved[idx] = Some(value);
            }
            if let Err(err) = self.remote.set_many(entries, ttl).await {
                warn!("Failed to store batch-computed values: {err}");
            }
        }

        Ok(resolved
            .into_iter()
            .map(|value| value.expect("every slot resolved above"))
            .collect())
    }

    // -----------------
    // Primitive access
    // -----------------
    // For pipelines that must write many related keys from a single upstream
    // call rather than one key per call.

    pub async fn get_remote<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> CacheResult<Option<T>> {
        match self.remote.get(key).await? {
            Some(bytes) => Ok(Some(deserialize(key, &bytes)?)),
            None => Ok(None),
        }
    }

    pub async fn get_remote_many<T: DeserializeOwned>(
        &self,
        keys: &[String],
    ) -> CacheResult<Vec<Option<T>>> {
        let cached = self.remote.get_many(keys).await?;
        let mut values = Vec::with_capacity(cached.len());
        for (key, bytes) in keys.iter().zip(cached) {
            values.push(match bytes {
                Some(bytes) => Some(deserialize(key, &bytes)?),
                None => None,
            });
        }
        Ok(values)
    }

    pub async fn set_remote<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> CacheResult<()> {
        self.remote.set(key, serialize(key, value)?, ttl).await
    }

    pub async fn set_remote_many<T: Serialize>(
        &self,
        entries: &[(String, T)],
        ttl: Duration,
    ) -> CacheResult<()> {
        let mut serialized = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            serialized.push((key.clone(), serialize(key, value)?));
        }
        self.remote.set_many(serialized, ttl).await
    }

    /// Removes `key` from both tiers; returns the keys actually invalidated
    /// (empty when the key was present in neither).
    pub async fn delete_in_cache(&self, key: &str) -> CacheResult<Vec<String>> {
        let in_local = self.local.delete(key);
        let in_remote = self.remote.delete(key).await?;
        if in_local || in_remote {
            Ok(vec![key.to_string()])
        } else {
            Ok(vec![])
        }
    }
}

fn mirror_ttl(ttl: Duration) -> Duration {
    ttl.min(LOCAL_MIRROR_TTL_CAP)
}

fn serialize<T: Serialize>(key: &str, value: &T) -> Result<Vec<u8>, CacheError> {
    serde_json::to_vec(value)
        .map_err(|err| CacheError::Serialization(key.to_string(), err.to_string()))
}

fn deserialize<T: DeserializeOwned>(key: &str, bytes: &[u8]) -> Result<T, CacheError> {
    serde_json::from_slice(bytes)
        .map_err(|err| CacheError::Serialization(key.to_string(), err.to_string()))
}
