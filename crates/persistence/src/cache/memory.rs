use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use super::Cache;
use crate::CacheError;

/// Expiry instant; `None` when the TTL is too large to represent
type Expiry = Option<Instant>;

fn is_live(expires_at: &Expiry, now: Instant) -> bool {
    expires_at.map_or(true, |at| now < at)
}

/// In-memory cache honoring expiry on read. Expired entries are dropped on
/// access and on every write.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: RwLock<HashMap<String, (String, Expiry)>>,
    writes: AtomicUsize,
    unavailable: AtomicBool,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `set` calls
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Entries currently held, expired or not
    pub async fn entry_count(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn contains(&self, key: &str) -> bool {
        matches!(self.get(key).await, Ok(Some(_)))
    }

    /// Make every subsequent call fail, as an unreachable Redis would
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), CacheError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable("in-memory cache switched off".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.check_available()?;

        let now = Instant::now();
        let mut entries = self.entries.write().await;
        match entries.get(key) {
            Some((value, expires_at)) if is_live(expires_at, now) => Ok(Some(value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        self.check_available()?;

        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, (_, expires_at)| is_live(expires_at, now));
        entries.insert(key.to_string(), (value.to_string(), now.checked_add(ttl)));
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_then_get() {
        let cache = InMemoryCache::new();
        cache.set("order:1", "{}", Duration::from_secs(60)).await.unwrap();

        assert_eq!(cache.get("order:1").await.unwrap().as_deref(), Some("{}"));
        assert_eq!(cache.writes(), 1);
    }

    #[tokio::test]
    async fn test_expired_entry_is_a_miss() {
        let cache = InMemoryCache::new();
        cache.set("order:1", "{}", Duration::from_millis(10)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert!(cache.get("order:1").await.unwrap().is_none());
        assert_eq!(cache.entry_count().await, 0);
    }

    #[tokio::test]
    async fn test_writes_evict_expired_entries() {
        let cache = InMemoryCache::new();
        cache.set("order:1", "{}", Duration::from_millis(10)).await.unwrap();
        cache.set("order:2", "{}", Duration::from_millis(10)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        cache.set("order:3", "{}", Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.entry_count().await, 1);
    }

    #[tokio::test]
    async fn test_unrepresentable_ttl_never_expires() {
        let cache = InMemoryCache::new();
        cache.set("order:1", "{}", Duration::MAX).await.unwrap();

        assert_eq!(cache.get("order:1").await.unwrap().as_deref(), Some("{}"));
    }

    #[tokio::test]
    async fn test_unavailable_cache_errors() {
        let cache = InMemoryCache::new();
        cache.set_unavailable(true);

        assert!(cache.get("order:1").await.is_err());
    }
}
