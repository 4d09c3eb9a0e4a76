//! Cache store seam
//!
//! The fetch executor writes successful documents through a `CacheStore` and
//! serves later requests from it until the entry expires. Values are JSON so
//! any serializable type can be stored.

mod memory;

pub use memory::MemoryCache;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

/// A cached value and its expiry
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub value: serde_json::Value,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(value: serde_json::Value, ttl_secs: u64) -> Self {
        Self {
            value,
            expires_at: expiry_from_now(ttl_secs),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }

    /// Deserializes the cached value
    pub fn decode<T: DeserializeOwned>(&self) -> crate::Result<T> {
        Ok(serde_json::from_value(self.value.clone())?)
    }
}

/// Expiry instant `ttl_secs` from now
pub(crate) fn expiry_from_now(ttl_secs: u64) -> DateTime<Utc> {
    let max_secs = (i64::MAX / 1000) as u64;
    let ttl = chrono::Duration::seconds(ttl_secs.min(max_secs) as i64);
    Utc::now()
        .checked_add_signed(ttl)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Key/value store with per-entry TTL
///
/// Expired entries are reported as misses.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> crate::Result<Option<CacheEntry>>;

    async fn set(&self, key: &str, value: serde_json::Value, ttl_secs: u64) -> crate::Result<()>;

    async fn delete(&self, key: &str) -> crate::Result<()>;

    async fn clear(&self) -> crate::Result<()>;
}

/// Serializes `value` and stores it under `key`
pub async fn put_json<C, T>(cache: &C, key: &str, value: &T, ttl_secs: u64) -> crate::Result<()>
where
    C: CacheStore + ?Sized,
    T: Serialize + Sync,
{
    cache.set(key, serde_json::to_value(value)?, ttl_secs).await
}

/// Reads and deserializes the value under `key`
pub async fn get_json<C, T>(cache: &C, key: &str) -> crate::Result<Option<T>>
where
    C: CacheStore + ?Sized,
    T: DeserializeOwned,
{
    match cache.get(key).await? {
        Some(entry) => Ok(Some(entry.decode()?)),
        None => Ok(None),
    }
}
