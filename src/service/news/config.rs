use std::env;
use std::time::Duration;

use encoding_rs::Encoding;
use thiserror::Error;
use url::Url;

pub const DEFAULT_SOURCE_URL: &str = "https://www.mulungu.ce.gov.br/informa.php";
pub const DEFAULT_SITE_ORIGIN: &str = "https://www.mulungu.ce.gov.br";
pub const DEFAULT_CHARSET: &str = "iso-8859-1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 8;
pub const DEFAULT_MAX_ITEMS: usize = 6;
pub const MAX_ITEMS_LIMIT: usize = 20;
pub const DEFAULT_CATEGORY: &str = "Informativo";
pub const DEFAULT_DATE: &str = "Recente";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} must be a number, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },
    #[error("{key} is not a known charset label: {value:?}")]
    UnknownCharset { key: &'static str, value: String },
    #[error("{key} is not a valid CSS selector: {value:?}")]
    InvalidSelector { key: &'static str, value: String },
    #[error("{key} is not a valid socket address: {value:?}")]
    InvalidAddress { key: &'static str, value: String },
    #[error("{key} is not a valid absolute URL: {source}")]
    InvalidUrl {
        key: &'static str,
        #[source]
        source: url::ParseError,
    },
}

/// CSS selectors driving the card extractor. Upstream markup changes without
/// notice, so every one of these can be overridden from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorConfig {
    pub container: String,
    pub title: String,
    pub snippet: String,
    pub category: String,
    pub link: String,
    pub image: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            container: ".noticia_item, .blog-post, .card".to_string(),
            title: "h1, h2, h3, h4, h5, .titulo, .title".to_string(),
            snippet: "p, .resumo, .data, .date, small".to_string(),
            category: ".categoria, .badge, .label, .tag".to_string(),
            link: "a[href]".to_string(),
            image: "img".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewsConfig {
    pub source_url: Url,
    pub site_origin: Url,
    pub charset: &'static Encoding,
    pub timeout: Duration,
    pub user_agent: String,
    pub max_items: usize,
    pub default_category: String,
    pub default_date: String,
    pub selectors: SelectorConfig,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            source_url: Url::parse(DEFAULT_SOURCE_URL).expect("default source url is valid"),
            site_origin: Url::parse(DEFAULT_SITE_ORIGIN).expect("default origin is valid"),
            charset: encoding_rs::WINDOWS_1252,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_items: DEFAULT_MAX_ITEMS,
            default_category: DEFAULT_CATEGORY.to_string(),
            default_date: DEFAULT_DATE.to_string(),
            selectors: SelectorConfig::default(),
        }
    }
}

impl NewsConfig {
    /// Build the config from `NEWS_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Overlay values returned by `lookup` on top of the defaults. Blank values
    /// count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut config = Self::default();

        if let Some(raw) = get("NEWS_SOURCE_URL") {
            config.source_url = parse_url("NEWS_SOURCE_URL", &raw)?;
        }
        if let Some(raw) = get("NEWS_SITE_ORIGIN") {
            config.site_origin = parse_url("NEWS_SITE_ORIGIN", &raw)?;
        }
        let charset = get("NEWS_SOURCE_CHARSET").unwrap_or_else(|| DEFAULT_CHARSET.to_string());
        config.charset = Encoding::for_label(charset.as_bytes()).ok_or(
            ConfigError::UnknownCharset {
                key: "NEWS_SOURCE_CHARSET",
                value: charset.clone(),
            },
        )?;
        if let Some(raw) = get("NEWS_TIMEOUT_SECS") {
            config.timeout = Duration::from_secs(parse_number("NEWS_TIMEOUT_SECS", &raw)?);
        }
        if let Some(ua) = get("NEWS_USER_AGENT") {
            config.user_agent = ua;
        }
        if let Some(raw) = get("NEWS_MAX_ITEMS") {
            let max = parse_number("NEWS_MAX_ITEMS", &raw)?;
            config.max_items = (max as usize).clamp(1, MAX_ITEMS_LIMIT);
        }
        if let Some(category) = get("NEWS_DEFAULT_CATEGORY") {
            config.default_category = category;
        }
        if let Some(date) = get("NEWS_DEFAULT_DATE") {
            config.default_date = date;
        }

        let selectors = &mut config.selectors;
        for (key, slot) in [
            ("NEWS_SELECTOR_CONTAINER", &mut selectors.container),
            ("NEWS_SELECTOR_TITLE", &mut selectors.title),
            ("NEWS_SELECTOR_SNIPPET", &mut selectors.snippet),
            ("NEWS_SELECTOR_CATEGORY", &mut selectors.category),
            ("NEWS_SELECTOR_LINK", &mut selectors.link),
            ("NEWS_SELECTOR_IMAGE", &mut selectors.image),
        ] {
            if let Some(value) = get(key) {
                *slot = value;
            }
        }

        Ok(config)
    }
}

pub(crate) fn parse_number(key: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.parse::<u64>().map_err(|_| ConfigError::InvalidNumber {
        key,
        value: raw.to_string(),
    })
}

fn parse_url(key: &'static str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|source| ConfigError::InvalidUrl { key, source })
}
