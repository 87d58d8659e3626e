use regex::Regex;
use url::{Origin, Url};
use tracing::debug;

use crate::error::{CrawlError, Result};

/// Static assets never count as pages
const ASSET_PATTERN: &str = r"(?i)\.(jpg|jpeg|png|gif|webp|svg|css|js|pdf|xml|txt)$";

/// Normalize a URL into its dedup key: scheme, host, path and query with the
/// fragment stripped
pub fn normalize_url(url: &str) -> Result<String> {
    let mut parsed = Url::parse(url.trim()).map_err(|e| CrawlError::InvalidUrl(format!("{}: {}", url, e)))?;
    parsed.set_fragment(None);
    Ok(parsed.to_string())
}

/// Decides which URLs belong to the crawl: same origin as the start URL,
/// not a static asset, not a category/tag listing and not the bare root
#[derive(Debug, Clone)]
pub struct CrawlScope {
    origin: Origin,
    asset_pattern: Regex,
}

impl CrawlScope {
    pub fn new(start_url: &str) -> Result<Self> {
        let start = Url::parse(start_url).map_err(|e| CrawlError::InvalidUrl(format!("{}: {}", start_url, e)))?;
        let asset_pattern = Regex::new(ASSET_PATTERN)
            .map_err(|e| CrawlError::Config(format!("asset pattern: {}", e)))?;

        Ok(Self {
            origin: start.origin(),
            asset_pattern,
        })
    }

    pub fn same_origin(&self, url: &Url) -> bool {
        url.origin() == self.origin
    }

    pub fn is_asset(&self, url: &Url) -> bool {
        self.asset_pattern.is_match(url.path())
    }

    /// Check whether a URL looks like an article on the crawled site
    pub fn is_article_url(&self, url: &str) -> bool {
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!("Skipping unparseable URL {}: {}", url, e);
                return false;
            }
        };

        let path = parsed.path();
        if self.is_asset(&parsed) || path.contains("/category") || path.contains("/tag") {
            return false;
        }

        self.same_origin(&parsed) && path.len() > 1
    }

    /// Filter links discovered on `page_url` down to normalized article
    /// candidates on the page's own origin
    pub fn discovered_candidates(&self, page_url: &str, links: &[String]) -> Vec<String> {
        let page_origin = match Url::parse(page_url) {
            Ok(url) => url.origin(),
            Err(_) => return Vec::new(),
        };

        links
            .iter()
            .filter_map(|link| {
                let parsed = Url::parse(link).ok()?;
                if parsed.origin() != page_origin {
                    return None;
                }
                let normalized = normalize_url(link).ok()?;
                self.is_article_url(&normalized).then_some(normalized)
            })
            .collect()
    }
}
