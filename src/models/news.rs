use serde::{Deserialize, Serialize};

/// One headline as served to the portal's news carousel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub title: String,
    pub category: String,
    pub date: String,
    pub link: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Top-level body of `GET /api/news`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsEnvelope {
    pub news: Vec<NewsRecord>,
}

impl NewsEnvelope {
    pub fn new(news: Vec<NewsRecord>) -> Self {
        Self { news }
    }
}
