use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, http::Method, routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, warn};

use crate::models::NewsEnvelope;
use crate::service::caching::collections::news as news_cache;
use crate::service::caching::ResponseCache;
use crate::service::news::{FeedSource, NewsService};

pub mod config;

pub use config::ServerConfig;

#[derive(Clone)]
pub struct AppState {
    news: Arc<NewsService>,
    cache: Option<(ResponseCache, Duration)>,
}

impl AppState {
    pub fn new(news: Arc<NewsService>) -> Self {
        Self { news, cache: None }
    }

    /// Cache live envelopes for `ttl`.
    pub fn with_cache(mut self, cache: ResponseCache, ttl: Duration) -> Self {
        self.cache = Some((cache, ttl));
        self
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/news", get(news_handler))
        .route("/health", get(health_handler))
        .layer(cors_layer())
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any)
}

async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Always 200: scrape failures come back as the fallback list.
async fn news_handler(State(state): State<AppState>) -> Json<NewsEnvelope> {
    if let Some((cache, _)) = &state.cache {
        match news_cache::load_latest(cache).await {
            Ok(Some(envelope)) => {
                debug!(backend = cache.backend(), "serving cached news");
                return Json(envelope);
            }
            Ok(None) => {}
            Err(err) => warn!(error = %err, "news cache read failed"),
        }
    }

    let feed = state.news.latest().await;
    let source = feed.source;
    let envelope = feed.into_envelope();

    if let (Some((cache, ttl)), FeedSource::Live) = (&state.cache, source) {
        if let Err(err) = news_cache::store_latest(cache, &envelope, *ttl).await {
            warn!(error = %err, "news cache write failed");
        }
    }

    Json(envelope)
}
