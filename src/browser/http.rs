use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::browser::extract::extract_page;
use crate::browser::{PageFetcher, RenderedPage};
use crate::error::{CrawlError, Result};

/// Fetches pages with a plain HTTP GET; no JavaScript is executed
pub struct HttpPageFetcher {
    client: Client,
}

impl HttpPageFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| CrawlError::Config(format!("page HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> Result<RenderedPage> {
        debug!("GET {}", url);

        let response = self.client.get(url)
            .send()
            .await
            .map_err(|e| CrawlError::transport(url, e))?;

        let status = response.status().as_u16();
        let body = response.text()
            .await
            .map_err(|e| CrawlError::transport(url, e))?;

        Ok(extract_page(&body, url, status))
    }
}
