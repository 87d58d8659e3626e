pub mod images;
pub mod mongo;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::browser::PageFacts;
use crate::error::Result;
use crate::seo::{Finding, ReportSummary};

// Re-export common types
pub use images::ImageArchiver;
pub use mongo::MongoPageStore;

/// Maximum characters of page content kept in a record
const CONTENT_LIMIT: usize = 5000;

/// Head metadata stored with each page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageMetadata {
    pub title: String,
    pub h1: String,
    pub description: String,
    pub canonical: String,
    pub lang: String,
    pub viewport: String,
}

/// Stored record of one analyzed page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    pub run_id: String,
    pub url: String,
    pub metadata: PageMetadata,
    pub price: String,
    pub content: String,

    /// File names of archived images
    pub images: Vec<String>,
    pub seo_warnings: Vec<String>,
    pub crawled_at: DateTime<Utc>,
}

impl PageRecord {
    pub fn new(run_id: &str, url: &str, facts: &PageFacts, images: Vec<String>, findings: &[Finding]) -> Self {
        Self {
            run_id: run_id.to_string(),
            url: url.to_string(),
            metadata: PageMetadata {
                title: facts.title.clone(),
                h1: facts.h1.clone(),
                description: facts.description.clone(),
                canonical: facts.canonical.clone(),
                lang: facts.lang.clone(),
                viewport: facts.viewport.clone(),
            },
            price: facts.price.clone(),
            content: facts.content.chars().take(CONTENT_LIMIT).collect(),
            images,
            seo_warnings: findings.iter().map(|finding| finding.to_string()).collect(),
            crawled_at: Utc::now(),
        }
    }
}

/// Document store for page records and run summaries.
///
/// Failures are reported to the caller, which logs them without stopping
/// the crawl.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageStore: Send + Sync {
    async fn insert_page_record(&self, record: &PageRecord) -> Result<()>;

    async fn insert_report_summary(&self, summary: &ReportSummary) -> Result<()>;

    /// Remove every document from the named collection
    async fn clear_collection(&self, name: &str) -> Result<()>;
}

/// Store used when persistence is disabled
pub struct NullStore;

#[async_trait]
impl PageStore for NullStore {
    async fn insert_page_record(&self, record: &PageRecord) -> Result<()> {
        debug!("Storage disabled, not storing {}", record.url);
        Ok(())
    }

    async fn insert_report_summary(&self, _summary: &ReportSummary) -> Result<()> {
        Ok(())
    }

    async fn clear_collection(&self, _name: &str) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_truncates_content() {
        let facts = PageFacts {
            title: "Title".to_string(),
            content: "ê".repeat(CONTENT_LIMIT + 10),
            ..PageFacts::default()
        };
        let record = PageRecord::new("run", "https://example.com/a", &facts, vec!["a.jpg".to_string()], &[Finding::MissingH1]);

        assert_eq!(record.content.chars().count(), CONTENT_LIMIT);
        assert_eq!(record.metadata.title, "Title");
        assert_eq!(record.seo_warnings, vec!["Missing H1 tag"]);
        assert_eq!(record.images, vec!["a.jpg"]);
    }
}
