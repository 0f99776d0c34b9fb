use std::sync::Arc;

use anyhow::{Context, Result};
use dotenv::dotenv;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use mulungu_portal::service::api::{self, AppState, ServerConfig};
use mulungu_portal::service::caching::ResponseCache;
use mulungu_portal::service::news::{NewsConfig, NewsService};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let server = ServerConfig::from_env()?;
    let news_config = NewsConfig::from_env()?;

    info!(
        source = %news_config.source_url,
        charset = news_config.charset.name(),
        max_items = news_config.max_items,
        "Initializing NewsService..."
    );
    let news = Arc::new(NewsService::new(news_config)?);
    let mut state = AppState::new(news);

    if let Some(ttl) = server.cache_ttl {
        let cache = match server.redis_url.as_deref() {
            Some(url) => match ResponseCache::redis(url).await {
                Ok(cache) => cache,
                Err(err) => {
                    info!("Redis cache unavailable, using memory cache: {err}");
                    ResponseCache::memory()
                }
            },
            None => ResponseCache::memory(),
        };
        info!(backend = cache.backend(), ttl_secs = ttl.as_secs(), "News cache enabled");
        state = state.with_cache(cache, ttl);
    } else {
        info!("News cache disabled (NEWS_CACHE_TTL_SECS unset or 0)");
    }

    let listener = TcpListener::bind(server.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", server.bind_addr))?;
    info!("Serving /api/news on http://{}", server.bind_addr);

    axum::serve(listener, api::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server exited unexpectedly")?;

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutting down"),
        Err(err) => {
            error!("failed to listen for ctrl-c, running until killed: {err}");
            std::future::pending::<()>().await;
        }
    }
}
