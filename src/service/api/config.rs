use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use crate::service::news::config::{parse_number, ConfigError};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// `None` disables response caching.
    pub cache_ttl: Option<Duration>,
    pub redis_url: Option<String>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let raw_addr = get("PORTAL_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw_addr
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidAddress {
                key: "PORTAL_BIND_ADDR",
                value: raw_addr.clone(),
            })?;

        let cache_ttl = match get("NEWS_CACHE_TTL_SECS") {
            Some(raw) => match parse_number("NEWS_CACHE_TTL_SECS", &raw)? {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
            None => None,
        };

        Ok(Self {
            bind_addr,
            cache_ttl,
            redis_url: get("REDIS_URL"),
        })
    }
}
