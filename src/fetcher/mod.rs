/// Fetcher trait and shared types for retrieving remote documents.
///
/// All network access in the crate goes through [`Fetcher`], so the cache and
/// the catalog loader can be exercised against [`mock::MockFetcher`].
pub mod clean;
pub mod http;
pub mod mock;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

pub use http::HttpFetcher;

/// Errors that can occur while fetching a single document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("redirect blocked: {0}")]
    Redirect(String),

    #[error("unsupported content type: {0}")]
    UnsupportedContent(String),

    #[error("http client error: {0}")]
    Client(String),
}

/// A fetched and cleaned documentation page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub url: String,
    pub title: String,
    pub content: String,
}

/// Raw text retrieval.
///
/// Implementations must be `Send + Sync` to allow concurrent use
/// behind `Arc`.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `url` and return its body decoded as text.
    async fn get_text(&self, url: &str) -> Result<String, FetchError>;
}

/// Fetch `url` and clean it into a [`Page`].
pub async fn fetch_page(fetcher: &dyn Fetcher, url: &str) -> Result<Page, FetchError> {
    debug!("Fetching {url}");
    let raw = fetcher.get_text(url).await?;
    let page = clean::page_from_raw(url, &raw);
    debug!("Fetched {url} ({} chars)", page.content.len());
    Ok(page)
}
