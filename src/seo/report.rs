use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::Result;
use crate::seo::audit::Finding;

const RECOMMENDATIONS: [&str; 6] = [
    "Make sure every important page has a complete H1, title and description.",
    "Keep titles between 10-70 characters and descriptions between 50-160 characters.",
    "Check and fix broken links (404 pages).",
    "Add an alt attribute to every image to improve accessibility and image SEO.",
    "Set a correct canonical URL on every page.",
    "Use a responsive viewport tag so pages render well on mobile devices.",
];

/// A page whose images lack alt text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingAltPage {
    pub url: String,
    pub images: Vec<String>,
}

/// Findings for one audited page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageReport {
    pub url: String,
    pub findings: Vec<Finding>,
}

/// Site-wide result of the analysis phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlReport {
    pub run_id: String,
    pub domain: String,
    pub sitemap_used: String,
    pub total_analyzed: usize,
    pub total_missing_alt_images: usize,
    pub total_404: usize,
    pub pages_with_404: Vec<String>,
    pub pages_with_missing_alt: Vec<MissingAltPage>,

    /// Pages with at least one finding, in analysis order
    pub pages: Vec<PageReport>,
    pub created_at: DateTime<Utc>,
}

/// The aggregate without per-page detail, as persisted to the store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSummary {
    pub run_id: String,
    pub domain: String,
    pub sitemap_used: String,
    pub total_urls_analyzed: usize,
    pub total_missing_alt_images: usize,
    pub total_404_pages: usize,
    pub pages_with_404: Vec<String>,
    pub pages_with_missing_alt: Vec<MissingAltPage>,
    pub created_at: DateTime<Utc>,
}

impl CrawlReport {
    pub fn new(run_id: &str, domain: &str, sitemap_used: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            domain: domain.to_string(),
            sitemap_used: sitemap_used.to_string(),
            total_analyzed: 0,
            total_missing_alt_images: 0,
            total_404: 0,
            pages_with_404: Vec::new(),
            pages_with_missing_alt: Vec::new(),
            pages: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Fold one analyzed page into the totals
    pub fn record(&mut self, url: &str, findings: Vec<Finding>) {
        self.total_analyzed += 1;

        for finding in &findings {
            match finding {
                Finding::Missing404 => {
                    self.total_404 += 1;
                    self.pages_with_404.push(url.to_string());
                }
                Finding::ImagesMissingAlt { count, images } => {
                    self.total_missing_alt_images += count;
                    self.pages_with_missing_alt.push(MissingAltPage {
                        url: url.to_string(),
                        images: images.clone(),
                    });
                }
                _ => {}
            }
        }

        if !findings.is_empty() {
            self.pages.push(PageReport {
                url: url.to_string(),
                findings,
            });
        }
    }

    /// Count a URL that was visited but not fetched because robots.txt
    /// disallowed it
    pub fn record_skipped(&mut self, url: &str) {
        debug!("Counting robots-denied URL as analyzed: {}", url);
        self.total_analyzed += 1;
    }

    /// Stamp the report with the time it was completed
    pub fn finalize(&mut self) {
        self.created_at = Utc::now();
    }

    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            run_id: self.run_id.clone(),
            domain: self.domain.clone(),
            sitemap_used: self.sitemap_used.clone(),
            total_urls_analyzed: self.total_analyzed,
            total_missing_alt_images: self.total_missing_alt_images,
            total_404_pages: self.total_404,
            pages_with_404: self.pages_with_404.clone(),
            pages_with_missing_alt: self.pages_with_missing_alt.clone(),
            created_at: self.created_at,
        }
    }

    /// Plain-text report: summary, recommendations, then one block per page
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let local: DateTime<Local> = DateTime::from(self.created_at);

        out.push_str(&format!("=== SEO SUMMARY REPORT ({}) ===\n", local.format("%Y-%m-%d %H:%M:%S")));
        out.push_str(&format!("Domain: {}\n", self.domain));
        out.push_str(&format!("Sitemap used for analysis: {}\n", self.sitemap_used));
        out.push_str(&format!("Total URLs analyzed: {}\n", self.total_analyzed));
        out.push_str(&format!("Total images missing alt attribute: {}\n", self.total_missing_alt_images));
        out.push_str(&format!("Total pages returning 404: {}\n", self.total_404));
        out.push('\n');

        if !self.pages_with_404.is_empty() {
            out.push_str("--- 404 PAGES ---\n");
            for url in &self.pages_with_404 {
                out.push_str(&format!(" - {}\n", url));
            }
            out.push('\n');
        }

        if !self.pages_with_missing_alt.is_empty() {
            out.push_str("--- PAGES WITH IMAGES MISSING ALT ---\n");
            for page in &self.pages_with_missing_alt {
                out.push_str(&format!("\n=> Page: {}\n", page.url));
                for image in &page.images {
                    out.push_str(&format!("    - Image missing alt: {}\n", image));
                }
            }
            out.push('\n');
        }

        out.push_str("--- GENERAL RECOMMENDATIONS ---\n");
        for recommendation in RECOMMENDATIONS {
            out.push_str(&format!("- {}\n", recommendation));
        }

        out.push_str("\n=== PER-URL DETAILS ===\n\n");

        let blocks: Vec<String> = self
            .pages
            .iter()
            .map(|page| {
                let mut block = format!("URL: {}\n", page.url);
                for finding in &page.findings {
                    block.push_str(&format!("{}\n", finding));
                }
                block
            })
            .collect();
        out.push_str(&blocks.join("\n"));

        out
    }

    /// Write the text report to `destination`
    pub async fn write_text(&self, destination: &Path) -> Result<PathBuf> {
        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(destination, self.render_text()).await?;

        info!("Saved SEO report: {}", destination.display());
        Ok(destination.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CrawlReport {
        let mut report = CrawlReport::new("run-1", "example.com", "sitemap_new_generated.xml");
        report.record("https://example.com/gone", vec![Finding::Missing404]);
        report.record(
            "https://example.com/gallery",
            vec![
                Finding::MissingH1,
                Finding::ImagesMissingAlt {
                    count: 2,
                    images: vec!["https://example.com/1.jpg".to_string(), "https://example.com/2.jpg".to_string()],
                },
            ],
        );
        report.record("https://example.com/clean", vec![]);
        report
    }

    #[test]
    fn test_record_aggregates() {
        let report = sample();

        assert_eq!(report.total_analyzed, 3);
        assert_eq!(report.total_404, 1);
        assert_eq!(report.pages_with_404, vec!["https://example.com/gone"]);
        assert_eq!(report.total_missing_alt_images, 2);
        assert_eq!(report.pages_with_missing_alt.len(), 1);
        assert_eq!(report.pages_with_missing_alt[0].url, "https://example.com/gallery");

        // Clean pages are counted but not listed
        assert_eq!(report.pages.len(), 2);

        let summary = report.summary();
        assert_eq!(summary.total_urls_analyzed, 3);
        assert_eq!(summary.total_404_pages, 1);
    }

    #[test]
    fn test_render_text() {
        let text = sample().render_text();

        assert!(text.starts_with("=== SEO SUMMARY REPORT ("));
        assert!(text.contains("Domain: example.com\n"));
        assert!(text.contains("Sitemap used for analysis: sitemap_new_generated.xml\n"));
        assert!(text.contains("Total URLs analyzed: 3\n"));
        assert!(text.contains("Total images missing alt attribute: 2\n"));
        assert!(text.contains("Total pages returning 404: 1\n"));
        assert!(text.contains("--- 404 PAGES ---\n - https://example.com/gone\n"));
        assert!(text.contains("=> Page: https://example.com/gallery\n    - Image missing alt: https://example.com/1.jpg\n"));
        assert_eq!(text.matches("\n- ").count(), RECOMMENDATIONS.len());
        assert!(text.contains("URL: https://example.com/gone\nPage returned 404 (broken link)\n"));
        assert!(text.contains("URL: https://example.com/gallery\nMissing H1 tag\n2 image(s) missing alt attribute\n"));
        assert!(!text.contains("URL: https://example.com/clean"));

        // Summary sections come before the per-URL details
        assert!(text.find("GENERAL RECOMMENDATIONS").unwrap() < text.find("PER-URL DETAILS").unwrap());
    }

    #[test]
    fn test_skipped_urls_count_as_analyzed() {
        let mut report = sample();
        report.record_skipped("https://example.com/private");

        assert_eq!(report.total_analyzed, 4);
        assert_eq!(report.pages.len(), 2);
        assert_eq!(report.summary().total_urls_analyzed, 4);
        assert!(!report.render_text().contains("URL: https://example.com/private"));
    }

    #[test]
    fn test_finalize_stamps_completion_time() {
        let mut report = sample();
        let started = report.created_at;
        std::thread::sleep(std::time::Duration::from_millis(5));

        report.finalize();
        assert!(report.created_at > started);
        assert_eq!(report.summary().created_at, report.created_at);
    }

    #[test]
    fn test_empty_report_omits_lists() {
        let text = CrawlReport::new("run-2", "example.com", "s.xml").render_text();
        assert!(!text.contains("--- 404 PAGES ---"));
        assert!(!text.contains("--- PAGES WITH IMAGES MISSING ALT ---"));
        assert!(text.contains("Total URLs analyzed: 0"));
    }
}
