pub mod cache_aside;
pub mod memory;
pub mod redis_cache;

pub use cache_aside::CacheAside;
pub use memory::InMemoryCache;
pub use redis_cache::RedisCache;

use async_trait::async_trait;
use std::time::Duration;

use crate::CacheError;

/// Key/value cache with expiry. Values are serialized JSON.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Unexpired value for `key`, if any
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;
}
