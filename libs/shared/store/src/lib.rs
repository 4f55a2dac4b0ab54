// =====================================================================================
// SHARED SECURITY STORE - KEY/VALUE STATE BEHIND EVERY STATEFUL SECURITY COMPONENT
// =====================================================================================
//
// Rate-limit counters, sessions, CSRF tokens, velocity trackers, price history
// and blocklists all live behind this abstraction so that a multi-instance
// deployment can share one cache instead of fragmenting state per process.
// The in-memory backend is the default for tests and single-node runs; the
// redis backend is the production choice.
//
// =====================================================================================

pub mod memory;
pub mod redis_store;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

pub use memory::MemoryStore;
pub use redis_store::RedisStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(String),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Minimal key/value + list contract shared by all security components.
///
/// Reads and writes are individually consistent but there is deliberately no
/// compare-and-swap: the read-modify-write window between a `get` and the
/// following `set` is accepted, matching the tolerance for slight counter
/// overshoot the enforcement policies are written against.
#[async_trait]
pub trait SecurityStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StoreError>;
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
    async fn push(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StoreError>;
    async fn list(&self, key: &str) -> Result<Vec<String>, StoreError>;
    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError>;
    /// Returns the number of entries removed. The redis backend expires keys
    /// natively and always reports 0.
    async fn sweep_expired(&self) -> Result<u64, StoreError>;
}

/// Cloneable handle injected into each service. Adds typed JSON accessors on
/// top of the string-based trait.
#[derive(Clone)]
pub struct Store {
    inner: Arc<dyn SecurityStore>,
}

impl Store {
    pub fn memory() -> Self {
        Self {
            inner: Arc::new(MemoryStore::new()),
        }
    }

    pub async fn redis(url: &str) -> Result<Self, StoreError> {
        Ok(Self {
            inner: Arc::new(RedisStore::connect(url).await?),
        })
    }

    pub fn from_backend(backend: Arc<dyn SecurityStore>) -> Self {
        Self { inner: backend }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.inner.get(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub async fn set_json<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<(), StoreError> {
        let raw = serde_json::to_string(value)?;
        self.inner.set(key, &raw, ttl).await
    }

    pub async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.inner.delete(key).await
    }

    pub async fn push_json<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<(), StoreError> {
        let raw = serde_json::to_string(value)?;
        self.inner.push(key, &raw, ttl).await
    }

    pub async fn list_json<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>, StoreError> {
        let raw = self.inner.list(key).await?;
        let mut out = Vec::with_capacity(raw.len());
        for item in raw {
            out.push(serde_json::from_str(&item)?);
        }
        Ok(out)
    }

    pub async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        self.inner.keys_with_prefix(prefix).await
    }

    pub async fn sweep_expired(&self) -> Result<u64, StoreError> {
        self.inner.sweep_expired().await
    }
}

/// Namespaced deny set (blocked IPs, blocked users, blocked file hashes).
/// Each namespace is independent; membership checks degrade open on backend
/// failure with a warning rather than taking the request path down.
#[derive(Clone)]
pub struct BlockList {
    store: Store,
    namespace: &'static str,
}

impl BlockList {
    pub fn new(store: Store, namespace: &'static str) -> Self {
        Self { store, namespace }
    }

    fn key(&self, member: &str) -> String {
        format!("blocked:{}:{}", self.namespace, member)
    }

    pub async fn block(&self, member: &str) -> Result<(), StoreError> {
        self.store.set_json(&self.key(member), &true, None).await
    }

    pub async fn unblock(&self, member: &str) -> Result<(), StoreError> {
        self.store.delete(&self.key(member)).await
    }

    pub async fn contains(&self, member: &str) -> bool {
        match self.store.get_json::<bool>(&self.key(member)).await {
            Ok(entry) => entry.unwrap_or(false),
            Err(e) => {
                tracing::warn!(namespace = self.namespace, error = %e, "blocklist lookup failed, treating as unblocked");
                false
            }
        }
    }

    pub async fn members(&self) -> Result<Vec<String>, StoreError> {
        let prefix = format!("blocked:{}:", self.namespace);
        let keys = self.store.keys_with_prefix(&prefix).await?;
        Ok(keys
            .into_iter()
            .filter_map(|k| k.strip_prefix(&prefix).map(|s| s.to_string()))
            .collect())
    }
}
