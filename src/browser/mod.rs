pub mod extract;
pub mod http;
pub mod session;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

// Re-export common types
pub use http::HttpPageFetcher;
pub use session::BrowserPageFetcher;

/// Facts extracted from one rendered page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageFacts {
    /// HTTP status code of the main document
    pub status: u16,
    pub title: String,
    pub h1: String,
    pub description: String,
    pub canonical: String,
    pub lang: String,
    pub viewport: String,

    /// Absolute URLs of every image on the page
    pub images: Vec<String>,

    /// Images whose alt attribute is absent or blank
    pub images_missing_alt: Vec<String>,

    /// Best-effort main content text
    pub content: String,

    /// Best-effort price text
    pub price: String,
}

/// A fetched page: its facts plus the absolute links found on it
#[derive(Debug, Clone, Default)]
pub struct RenderedPage {
    pub url: String,
    pub facts: PageFacts,
    pub links: Vec<String>,
}

/// Fetches and renders a page, returning the DOM facts the crawl needs
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<RenderedPage>;

    /// Release any resources held by the fetcher
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
