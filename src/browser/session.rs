use async_trait::async_trait;
use std::time::Duration;
use thirtyfour::prelude::*;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::browser::extract::extract_page;
use crate::browser::{PageFetcher, RenderedPage};
use crate::cli::config::BrowserSettings;
use crate::error::{CrawlError, Result};

/// Reads the main document's HTTP status from the Navigation Timing entry
const STATUS_SCRIPT: &str = r#"
const entry = performance.getEntriesByType('navigation')[0];
return entry && entry.responseStatus ? entry.responseStatus : null;
"#;

/// Status assumed when the browser does not expose one
const DEFAULT_STATUS: u16 = 200;

/// Renders pages in a WebDriver-controlled Chrome session
pub struct BrowserPageFetcher {
    driver: Mutex<Option<WebDriver>>,
}

impl BrowserPageFetcher {
    /// Start a browser session with the crawler's user agent
    pub async fn connect(settings: &BrowserSettings, user_agent: &str, page_timeout: Duration) -> Result<Self> {
        let mut caps = DesiredCapabilities::chrome();

        caps.add_chrome_arg(&format!("--user-agent={}", user_agent))?;
        caps.add_chrome_arg("--disable-dev-shm-usage")?;
        if settings.headless {
            caps.set_headless()?;
        }

        let driver = WebDriver::new(&settings.webdriver_url, caps).await
            .map_err(|e| CrawlError::Browser(format!("Failed to connect to WebDriver at {}: {}", settings.webdriver_url, e)))?;

        driver.set_page_load_timeout(page_timeout).await?;

        info!("Browser session started via {}", settings.webdriver_url);

        Ok(Self {
            driver: Mutex::new(Some(driver)),
        })
    }
}

#[async_trait]
impl PageFetcher for BrowserPageFetcher {
    async fn fetch(&self, url: &str) -> Result<RenderedPage> {
        let guard = self.driver.lock().await;
        let driver = guard.as_ref()
            .ok_or_else(|| CrawlError::Browser("Browser session not initialized".to_string()))?;

        debug!("Navigating to: {}", url);
        driver.goto(url).await
            .map_err(|e| CrawlError::transport(url, e))?;

        let status = match driver.execute(STATUS_SCRIPT, Vec::new()).await {
            Ok(ret) => ret.json().as_u64().and_then(|code| u16::try_from(code).ok()).unwrap_or(DEFAULT_STATUS),
            Err(e) => {
                debug!("Could not read response status for {}: {}", url, e);
                DEFAULT_STATUS
            }
        };

        let source = driver.source().await
            .map_err(|e| CrawlError::transport(url, e))?;

        Ok(extract_page(&source, url, status))
    }

    async fn close(&self) -> Result<()> {
        if let Some(driver) = self.driver.lock().await.take() {
            if let Err(e) = driver.quit().await {
                error!("Error closing browser session: {}", e);
            }
            debug!("Browser session closed");
        }
        Ok(())
    }
}
