use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tokio::time::{Duration, Instant};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("store is full ({capacity} entries)")]
    Full { capacity: usize },
    #[error("malformed document under `{key}`: {source}")]
    Malformed {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode document for `{key}`: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// JSON key-value storage with optional per-entry expiry.
#[async_trait]
pub trait KvStore: Send + Sync + 'static {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Replaces any previous value under `key` together with its expiry.
    async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<(), StoreError>;
}

pub struct Config {
    pub capacity: usize,
}

struct Entry {
    value: Value,
    deadline: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| deadline <= now)
    }
}

/// In-process store. Live entries are only ever removed by their expiry; a write
/// of a new key into a full store fails instead of evicting anything.
pub struct MemoryStore {
    capacity: usize,
    inner: RwLock<HashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new(config: Config) -> Arc<Self> {
        Arc::new(Self {
            capacity: config.capacity,
            inner: Default::default(),
        })
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Drops every expired entry, returning how many were removed.
    pub async fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut inner = self.inner.write().await;
        let before = inner.len();
        inner.retain(|_, entry| !entry.is_expired(now));
        before - inner.len()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let now = Instant::now();

        {
            let inner = self.inner.read().await;
            match inner.get(key) {
                None => return Ok(None),
                Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.value.clone())),
                Some(_) => {}
            }
        }

        let mut inner = self.inner.write().await;
        if inner.get(key).is_some_and(|entry| entry.is_expired(now)) {
            log::debug!("Evicting expired entry `{key}`");
            inner.remove(key);
        }

        Ok(None)
    }

    async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<(), StoreError> {
        let now = Instant::now();
        let entry = Entry {
            value,
            deadline: ttl.map(|ttl| now + ttl),
        };

        let mut inner = self.inner.write().await;

        if !inner.contains_key(key) && inner.len() >= self.capacity {
            inner.retain(|_, entry| !entry.is_expired(now));

            if inner.len() >= self.capacity {
                log::warn!("Refusing to store `{key}`: store is full");
                return Err(StoreError::Full {
                    capacity: self.capacity,
                });
            }
        }

        inner.insert(key.to_string(), entry);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn store() -> Arc<MemoryStore> {
        MemoryStore::new(Config { capacity: 16 })
    }

    #[tokio::test]
    async fn set_then_get() {
        let store = store();
        assert_eq!(store.get("a").await.unwrap(), None);

        store.set("a", json!({ "x": 1 }), None).await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), Some(json!({ "x": 1 })));

        store.set("a", json!(2), None).await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), Some(json!(2)));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire() {
        let store = store();
        store
            .set("a", json!(1), Some(Duration::from_secs(60)))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(store.get("a").await.unwrap(), Some(json!(1)));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(store.get("a").await.unwrap(), None);
        assert!(store.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn rewrite_refreshes_expiry() {
        let store = store();
        let ttl = Some(Duration::from_secs(60));
        store.set("a", json!(1), ttl).await.unwrap();

        tokio::time::advance(Duration::from_secs(45)).await;
        store.set("a", json!(2), ttl).await.unwrap();

        tokio::time::advance(Duration::from_secs(45)).await;
        assert_eq!(store.get("a").await.unwrap(), Some(json!(2)));
    }

    #[tokio::test(start_paused = true)]
    async fn entries_without_ttl_persist() {
        let store = store();
        store.set("a", json!(1), None).await.unwrap();

        tokio::time::advance(Duration::from_secs(60 * 60 * 24 * 365)).await;
        assert_eq!(store.get("a").await.unwrap(), Some(json!(1)));
    }

    #[tokio::test]
    async fn full_store_refuses_new_keys() {
        let store = MemoryStore::new(Config { capacity: 2 });
        store.set("a", json!(1), None).await.unwrap();
        store.set("b", json!(2), None).await.unwrap();

        let err = store.set("c", json!(3), None).await.unwrap_err();
        assert!(matches!(err, StoreError::Full { capacity: 2 }));

        store.set("a", json!(10), None).await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), Some(json!(10)));
        assert_eq!(store.get("b").await.unwrap(), Some(json!(2)));
        assert_eq!(store.get("c").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entries_free_capacity() {
        let store = MemoryStore::new(Config { capacity: 2 });
        store
            .set("a", json!(1), Some(Duration::from_secs(60)))
            .await
            .unwrap();
        store.set("b", json!(2), None).await.unwrap();

        tokio::time::advance(Duration::from_secs(61)).await;
        store.set("c", json!(3), None).await.unwrap();

        assert_eq!(store.get("a").await.unwrap(), None);
        assert_eq!(store.get("b").await.unwrap(), Some(json!(2)));
        assert_eq!(store.get("c").await.unwrap(), Some(json!(3)));
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_drops_only_expired() {
        let store = store();
        store
            .set("a", json!(1), Some(Duration::from_secs(60)))
            .await
            .unwrap();
        store.set("b", json!(2), None).await.unwrap();

        tokio::time::advance(Duration::from_secs(60)).await;
        assert_eq!(store.sweep().await, 1);
        assert_eq!(store.len().await, 1);
    }
}
