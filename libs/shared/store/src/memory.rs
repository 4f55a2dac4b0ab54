use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{SecurityStore, StoreError};

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

struct ListEntry {
    values: Vec<String>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.map(|t| now >= t).unwrap_or(false)
    }
}

impl ListEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.map(|t| now >= t).unwrap_or(false)
    }
}

/// Process-local backend. Expired entries are skipped on read and reclaimed by
/// `sweep_expired`, which the admin cleanup endpoint drives periodically so
/// unique-key churn cannot grow the maps without bound.
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Entry>>,
    lists: RwLock<HashMap<String, ListEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            lists: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SecurityStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.read().await;
        let now = Instant::now();
        Ok(entries
            .get(key)
            .filter(|e| !e.is_expired(now))
            .map(|e| e.value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: ttl.map(|d| Instant::now() + d),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.entries.write().await.remove(key);
        self.lists.write().await.remove(key);
        Ok(())
    }

    async fn push(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StoreError> {
        let mut lists = self.lists.write().await;
        let now = Instant::now();
        let entry = lists.entry(key.to_string()).or_insert_with(|| ListEntry {
            values: Vec::new(),
            expires_at: None,
        });
        if entry.is_expired(now) {
            entry.values.clear();
        }
        entry.values.push(value.to_string());
        entry.expires_at = ttl.map(|d| now + d);
        Ok(())
    }

    async fn list(&self, key: &str) -> Result<Vec<String>, StoreError> {
        let lists = self.lists.read().await;
        let now = Instant::now();
        Ok(lists
            .get(key)
            .filter(|e| !e.is_expired(now))
            .map(|e| e.values.clone())
            .unwrap_or_default())
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let now = Instant::now();
        let mut keys: Vec<String> = {
            let entries = self.entries.read().await;
            entries
                .iter()
                .filter(|(k, e)| k.starts_with(prefix) && !e.is_expired(now))
                .map(|(k, _)| k.clone())
                .collect()
        };
        {
            let lists = self.lists.read().await;
            keys.extend(
                lists
                    .iter()
                    .filter(|(k, e)| k.starts_with(prefix) && !e.is_expired(now))
                    .map(|(k, _)| k.clone()),
            );
        }
        Ok(keys)
    }

    async fn sweep_expired(&self) -> Result<u64, StoreError> {
        let now = Instant::now();
        let mut removed = 0u64;
        {
            let mut entries = self.entries.write().await;
            let before = entries.len();
            entries.retain(|_, e| !e.is_expired(now));
            removed += (before - entries.len()) as u64;
        }
        {
            let mut lists = self.lists.write().await;
            let before = lists.len();
            lists.retain(|_, e| !e.is_expired(now));
            removed += (before - lists.len()) as u64;
        }
        Ok(removed)
    }
}
