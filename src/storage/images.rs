use chrono::Utc;
use regex::Regex;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::error::{CrawlError, Result};

const FOLDER_NAME_LIMIT: usize = 50;
const UNSAFE_FOLDER_CHARS: &str = r"[^a-zA-Z0-9_-]+";

/// Folder name for a page's images, derived from its URL path
fn page_folder_name(page_url: &str, unsafe_chars: &Regex) -> String {
    let path = Url::parse(page_url)
        .map(|url| url.path().to_string())
        .unwrap_or_default();
    let trimmed = path.trim_end_matches('/').trim_start_matches('/');

    if trimmed.is_empty() {
        return "root_page".to_string();
    }

    unsafe_chars.replace_all(trimmed, "_").chars().take(FOLDER_NAME_LIMIT).collect()
}

/// File name for a downloaded image: the last path segment when it has an
/// extension, otherwise a timestamped name using the content subtype
fn image_file_name(image_url: &Url, content_type: Option<&str>) -> String {
    let last = image_url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or_default();

    if !last.is_empty() && last.contains('.') {
        return last.to_string();
    }

    let extension = content_type
        .and_then(|value| value.split(';').next())
        .and_then(|mime| mime.split('/').nth(1))
        .filter(|subtype| !subtype.is_empty())
        .unwrap_or("jpg");

    format!("image_{}.{}", Utc::now().timestamp_millis(), extension)
}

/// Downloads a few images from each audited page into the output folder
pub struct ImageArchiver {
    client: Client,
    root: PathBuf,
    max_per_page: usize,
    folder_pattern: Regex,
}

impl ImageArchiver {
    pub fn new(root: PathBuf, max_per_page: usize, user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| CrawlError::Config(format!("image HTTP client: {}", e)))?;
        let folder_pattern = Regex::new(UNSAFE_FOLDER_CHARS)
            .map_err(|e| CrawlError::Config(format!("image folder pattern: {}", e)))?;

        Ok(Self {
            client,
            root,
            max_per_page,
            folder_pattern,
        })
    }

    /// Download up to `max_per_page` images; returns the saved file names.
    /// Individual failures are logged and skipped.
    pub async fn archive(&self, page_url: &str, images: &[String]) -> Vec<String> {
        let folder = self.root.join(page_folder_name(page_url, &self.folder_pattern));
        let mut saved = Vec::new();

        for image in images.iter().filter(|src| !src.is_empty()).take(self.max_per_page) {
            match self.download(image, &folder).await {
                Ok(name) => saved.push(name),
                Err(e) => warn!("Image download failed ({}): {}", e, image),
            }
        }

        saved
    }

    async fn download(&self, image: &str, folder: &Path) -> Result<String> {
        let image_url = Url::parse(image).map_err(|e| CrawlError::InvalidUrl(format!("{}: {}", image, e)))?;

        let response = self.client.get(image_url.clone())
            .send()
            .await
            .map_err(|e| CrawlError::transport(image, e))?;

        if !response.status().is_success() {
            return Err(CrawlError::transport(image, format!("status {}", response.status())));
        }

        let content_type = response.headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let bytes = response.bytes()
            .await
            .map_err(|e| CrawlError::transport(image, e))?;

        tokio::fs::create_dir_all(folder).await?;
        let name = image_file_name(&image_url, content_type.as_deref());
        tokio::fs::write(folder.join(&name), &bytes).await?;

        debug!("Saved image {} as {}", image, name);
        Ok(name)
    }
}
