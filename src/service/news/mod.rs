use reqwest::StatusCode;
use scraper::Html;
use tracing::{debug, info, warn};

use crate::models::{NewsEnvelope, NewsRecord};

pub mod config;
pub mod decode;
pub mod extract;
pub mod fallback;
pub mod normalize;

pub use config::{ConfigError, NewsConfig, SelectorConfig};
pub use fallback::{fallback_news, FALLBACK_VERSION};

use extract::SelectorSet;
use normalize::Normalizer;

#[derive(Debug, thiserror::Error)]
pub enum NewsServiceError {
    #[error("news page request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("news page returned status {0}")]
    Status(StatusCode),
    #[error("no news cards found on the page")]
    Empty,
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Where a feed's records came from. Never exposed on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedSource {
    Live,
    Fallback,
}

#[derive(Debug, Clone)]
pub struct NewsFeed {
    pub source: FeedSource,
    pub news: Vec<NewsRecord>,
}

impl NewsFeed {
    pub fn into_envelope(self) -> NewsEnvelope {
        NewsEnvelope::new(self.news)
    }
}

pub struct NewsService {
    client: reqwest::Client,
    config: NewsConfig,
    selectors: SelectorSet,
    normalizer: Normalizer,
}

impl NewsService {
    /// Build the service. Fails only on bad selectors or an unbuildable
    /// HTTP client.
    pub fn new(config: NewsConfig) -> Result<Self, NewsServiceError> {
        let selectors = SelectorSet::compile(&config.selectors)?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()?;
        let normalizer = Normalizer::new(
            config.site_origin.clone(),
            config.default_category.clone(),
            config.default_date.clone(),
        );

        Ok(Self {
            client,
            config,
            selectors,
            normalizer,
        })
    }

    /// Latest headlines. Any failure along the way degrades to the fallback
    /// list, so this always returns at least one record.
    pub async fn latest(&self) -> NewsFeed {
        match self.scrape().await {
            Ok(news) => {
                info!(count = news.len(), "serving live news");
                NewsFeed {
                    source: FeedSource::Live,
                    news,
                }
            }
            Err(err) => {
                warn!(
                    error = %err,
                    version = FALLBACK_VERSION,
                    "news scrape failed; serving fallback"
                );
                NewsFeed {
                    source: FeedSource::Fallback,
                    news: fallback_news().to_vec(),
                }
            }
        }
    }

    /// Fetch the source page and run it through the pipeline.
    pub async fn scrape(&self) -> Result<Vec<NewsRecord>, NewsServiceError> {
        let body = self.fetch_page().await?;
        let html = decode::decode_html(&body, self.config.charset);
        let news = self.parse_page(&html);
        if news.is_empty() {
            return Err(NewsServiceError::Empty);
        }
        Ok(news)
    }

    /// Extract and normalize records from an already decoded page.
    pub fn parse_page(&self, html: &str) -> Vec<NewsRecord> {
        let document = Html::parse_document(html);
        let mut news: Vec<NewsRecord> =
            extract::extract_cards(&document, &self.selectors, self.config.max_items)
                .into_iter()
                .filter_map(|card| self.normalizer.normalize(card))
                .collect();
        normalize::assign_ids(&mut news);
        news
    }

    async fn fetch_page(&self) -> Result<Vec<u8>, NewsServiceError> {
        debug!(url = %self.config.source_url, "fetching news page");
        let resp = self.client.get(self.config.source_url.clone()).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(NewsServiceError::Status(status));
        }

        let bytes = resp.bytes().await?;
        debug!(bytes = bytes.len(), "news page downloaded");
        Ok(bytes.to_vec())
    }
}
