use crate::cache::{CacheEntry, CacheStore};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Process-local cache store
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> crate::Result<Option<CacheEntry>> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.is_expired() => {
                entries.remove(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.clone())),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: serde_json::Value, ttl_secs: u64) -> crate::Result<()> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), CacheEntry::new(value, ttl_secs));
        Ok(())
    }

    async fn delete(&self, key: &str) -> crate::Result<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }

    async fn clear(&self) -> crate::Result<()> {
        self.entries.lock().await.clear();
        Ok(())
    }
}
