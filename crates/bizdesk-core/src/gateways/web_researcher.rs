//! Web search and page scraping port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: Option<String>,
    pub image_url: Option<String>,
}

/// Metadata scraped from one page (`og:*` tags, `<title>`, meta description).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrapedPage {
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_urls: Vec<String>,
}

#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait WebResearcher: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, DomainError>;
    async fn fetch_page(&self, url: &str) -> Result<ScrapedPage, DomainError>;
}
