use async_trait::async_trait;
use reqwest::Client;
use sitemap::reader::{SiteMapEntity, SiteMapReader};
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::crawler::scope::CrawlScope;
use crate::error::{CrawlError, Result};

/// Loads sitemap documents by location
#[async_trait]
pub trait SitemapSource: Send + Sync {
    async fn load(&self, location: &str) -> Result<String>;
}

/// Loads `http(s)://` locations over the network and anything else from disk
pub struct DocumentLoader {
    client: Client,
}

impl DocumentLoader {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| CrawlError::Config(format!("sitemap HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl SitemapSource for DocumentLoader {
    async fn load(&self, location: &str) -> Result<String> {
        if location.starts_with("http://") || location.starts_with("https://") {
            let response = self.client.get(location)
                .send()
                .await
                .map_err(|e| CrawlError::transport(location, e))?;

            if !response.status().is_success() {
                return Err(CrawlError::transport(location, format!("status {}", response.status())));
            }

            response.text().await.map_err(|e| CrawlError::transport(location, e))
        } else {
            Ok(tokio::fs::read_to_string(Path::new(location)).await?)
        }
    }
}

/// Entries of one sitemap document
#[derive(Debug, Default, PartialEq)]
pub struct ParsedSitemap {
    /// `<url><loc>` values of a urlset
    pub urls: Vec<String>,

    /// `<sitemap><loc>` values of a sitemap index
    pub children: Vec<String>,
}

impl ParsedSitemap {
    pub fn is_index(&self) -> bool {
        !self.children.is_empty()
    }
}

/// Parse a urlset or sitemapindex document
pub fn parse_sitemap(xml: &str, source_name: &str) -> Result<ParsedSitemap> {
    let mut parsed = ParsedSitemap::default();
    let mut errors = Vec::new();

    for entity in SiteMapReader::new(Cursor::new(xml.as_bytes())) {
        match entity {
            SiteMapEntity::Url(entry) => {
                if let Some(url) = entry.loc.get_url() {
                    parsed.urls.push(url.to_string());
                }
            }
            SiteMapEntity::SiteMap(entry) => {
                if let Some(url) = entry.loc.get_url() {
                    parsed.children.push(url.to_string());
                }
            }
            SiteMapEntity::Err(e) => {
                // The XML reader repeats a fatal error forever
                errors.push(e.to_string());
                break;
            }
        }
    }

    if !errors.is_empty() {
        if parsed.urls.is_empty() && parsed.children.is_empty() {
            return Err(CrawlError::parse(source_name, errors.join("; ")));
        }
        warn!("Stopped reading {} at malformed XML: {}", source_name, errors.join("; "));
    }

    Ok(parsed)
}

/// Reads a sitemap or sitemap index into a filtered list of article URLs
pub struct SitemapReader {
    source: Arc<dyn SitemapSource>,
    scope: CrawlScope,
}

impl SitemapReader {
    pub fn new(source: Arc<dyn SitemapSource>, scope: CrawlScope) -> Self {
        Self { source, scope }
    }

    /// Collect the article URLs listed at `location`, following a sitemap
    /// index exactly one level down. Failures yield an empty list; duplicates
    /// are left for the caller.
    pub async fn read_urls(&self, location: &str) -> Vec<String> {
        info!("Loading sitemap from: {}", location);

        let top = match self.load_parsed(location).await {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Could not load or parse sitemap {}: {}", location, e);
                return Vec::new();
            }
        };

        let mut urls = top.urls;

        if !top.children.is_empty() {
            info!("Found sitemap index with {} child sitemaps", top.children.len());
        }

        for child in &top.children {
            match self.load_parsed(child).await {
                Ok(parsed) => {
                    if parsed.is_index() {
                        debug!("Not following nested sitemap index {}", child);
                    }
                    urls.extend(parsed.urls);
                }
                Err(e) => warn!("Skipping child sitemap {}: {}", child, e),
            }
        }

        let total = urls.len();
        let filtered: Vec<String> = urls
            .into_iter()
            .filter(|url| self.scope.is_article_url(url))
            .collect();

        info!("Sitemap {} lists {} URLs, {} after filtering", location, total, filtered.len());
        filtered
    }

    async fn load_parsed(&self, location: &str) -> Result<ParsedSitemap> {
        let xml = self.source.load(location).await?;
        parse_sitemap(&xml, location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct FakeSource {
        documents: HashMap<String, String>,
    }

    #[async_trait]
    impl SitemapSource for FakeSource {
        async fn load(&self, location: &str) -> Result<String> {
            self.documents
                .get(location)
                .cloned()
                .ok_or_else(|| CrawlError::transport(location, "status 404 Not Found"))
        }
    }

    fn urlset(locs: &[&str]) -> String {
        let entries: String = locs
            .iter()
            .map(|loc| format!("<url><loc>{}</loc></url>", loc))
            .collect();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{}</urlset>"#,
            entries
        )
    }

    fn index(children: &[&str]) -> String {
        let entries: String = children
            .iter()
            .map(|loc| format!("<sitemap><loc>{}</loc></sitemap>", loc))
            .collect();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{}</sitemapindex>"#,
            entries
        )
    }

    fn reader(documents: Vec<(&str, String)>) -> SitemapReader {
        let source = FakeSource {
            documents: documents.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
        };
        let scope = CrawlScope::new("https://example.com/").unwrap();
        SitemapReader::new(Arc::new(source), scope)
    }

    #[tokio::test]
    async fn test_urlset_is_filtered() {
        let reader = reader(vec![(
            "https://example.com/sitemap.xml",
            urlset(&[
                "https://example.com/post-1",
                "https://example.com/",
                "https://example.com/category/news",
                "https://example.com/tag/rust",
                "https://example.com/logo.png",
                "https://other.com/post",
                "https://example.com/post-2",
            ]),
        )]);

        let urls = reader.read_urls("https://example.com/sitemap.xml").await;
        assert_eq!(urls, vec!["https://example.com/post-1", "https://example.com/post-2"]);
    }

    #[tokio::test]
    async fn test_index_collects_both_children() {
        let reader = reader(vec![
            (
                "https://example.com/sitemap_index.xml",
                index(&["https://example.com/posts.xml", "https://example.com/pages.xml"]),
            ),
            ("https://example.com/posts.xml", urlset(&["https://example.com/p1", "https://example.com/p2"])),
            (
                "https://example.com/pages.xml",
                urlset(&["https://example.com/about", "https://example.com/contact", "https://example.com/faq"]),
            ),
        ]);

        let urls = reader.read_urls("https://example.com/sitemap_index.xml").await;
        assert_eq!(urls.len(), 5);
        assert_eq!(urls[0], "https://example.com/p1");
        assert_eq!(urls[4], "https://example.com/faq");
    }

    #[tokio::test]
    async fn test_index_survives_child_failure() {
        let reader = reader(vec![
            (
                "https://example.com/sitemap_index.xml",
                index(&["https://example.com/missing.xml", "https://example.com/posts.xml"]),
            ),
            ("https://example.com/posts.xml", urlset(&["https://example.com/p1", "https://example.com/p2"])),
        ]);

        let urls = reader.read_urls("https://example.com/sitemap_index.xml").await;
        assert_eq!(urls, vec!["https://example.com/p1", "https://example.com/p2"]);
    }

    #[tokio::test]
    async fn test_nested_index_not_followed() {
        let reader = reader(vec![
            ("https://example.com/sitemap_index.xml", index(&["https://example.com/nested.xml"])),
            ("https://example.com/nested.xml", index(&["https://example.com/deep.xml"])),
            ("https://example.com/deep.xml", urlset(&["https://example.com/deep-post"])),
        ]);

        let urls = reader.read_urls("https://example.com/sitemap_index.xml").await;
        assert!(urls.is_empty());
    }

    #[tokio::test]
    async fn test_missing_sitemap_is_empty() {
        let reader = reader(vec![]);
        assert!(reader.read_urls("https://example.com/sitemap.xml").await.is_empty());
    }

    #[tokio::test]
    async fn test_loader_reads_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sitemap.xml");
        std::fs::write(&path, urlset(&["https://example.com/p1"])).unwrap();

        let loader = DocumentLoader::new("TestBot/1.0", Duration::from_secs(5)).unwrap();
        let scope = CrawlScope::new("https://example.com/").unwrap();
        let reader = SitemapReader::new(Arc::new(loader), scope);

        let urls = reader.read_urls(path.to_str().unwrap()).await;
        assert_eq!(urls, vec!["https://example.com/p1"]);
    }

    #[tokio::test]
    async fn test_loader_rejects_http_error() {
        use wiremock::MockServer;

        let server = MockServer::start().await;
        let loader = DocumentLoader::new("TestBot/1.0", Duration::from_secs(5)).unwrap();
        let result = loader.load(&format!("{}/sitemap.xml", server.uri())).await;
        assert!(matches!(result, Err(CrawlError::Transport { .. })));
    }
}
