use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

pub mod collections;
pub mod memory;
pub mod redis;

pub use self::memory::MemoryCache;
pub use self::redis::RedisCache;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("redis error: {0}")]
    Redis(#[from] ::redis::RedisError),
    #[error("cached payload is not valid json: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Key/value cache handed to request handlers. Built once per process.
#[derive(Clone)]
pub enum ResponseCache {
    Memory(Arc<MemoryCache>),
    Redis(RedisCache),
}

impl ResponseCache {
    pub fn memory() -> Self {
        Self::Memory(Arc::new(MemoryCache::new()))
    }

    pub async fn redis(url: &str) -> Result<Self, CacheError> {
        Ok(Self::Redis(RedisCache::new(url).await?))
    }

    pub fn backend(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory",
            Self::Redis(_) => "redis",
        }
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        match self {
            Self::Memory(cache) => Ok(cache.get(key).await),
            Self::Redis(cache) => cache.get(key).await,
        }
    }

    pub async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        match self {
            Self::Memory(cache) => {
                cache.set(key, value, ttl).await;
                Ok(())
            }
            Self::Redis(cache) => cache.set(key, value, ttl).await,
        }
    }
}
