use std::time::Duration;

use crate::models::NewsEnvelope;
use crate::service::caching::{CacheError, ResponseCache};

const LATEST_NEWS_KEY: &str = "news:latest";

/// Cached envelope from the last live scrape, if still fresh.
pub async fn load_latest(cache: &ResponseCache) -> Result<Option<NewsEnvelope>, CacheError> {
    match cache.get(LATEST_NEWS_KEY).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

pub async fn store_latest(
    cache: &ResponseCache,
    envelope: &NewsEnvelope,
    ttl: Duration,
) -> Result<(), CacheError> {
    let raw = serde_json::to_string(envelope)?;
    cache.set(LATEST_NEWS_KEY, raw, ttl).await
}
