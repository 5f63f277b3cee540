pub mod cache;
pub mod repositories;

pub use cache::{Cache, CacheAside, InMemoryCache, RedisCache};
pub use repositories::{InMemoryOrderRepository, OrderRepository, PostgresOrderRepository};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Corrupt order row {id}: {reason}")]
    CorruptRow { id: i64, reason: String },

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Cache unavailable: {0}")]
    Unavailable(String),
}
