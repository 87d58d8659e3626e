use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

use crate::browser::PageFacts;

/// Acceptable title length in characters
pub const TITLE_LENGTH: RangeInclusive<usize> = 10..=70;

/// Acceptable meta description length in characters
pub const DESCRIPTION_LENGTH: RangeInclusive<usize> = 50..=160;

/// Viewport content that marks a responsive page
const RESPONSIVE_VIEWPORT: &str = "width=device-width";

/// One SEO issue found on a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Finding {
    Missing404,
    MissingH1,
    TitleLengthOutOfRange { length: usize },
    DescriptionLengthOutOfRange { length: usize },
    CanonicalMissingOrMismatched { observed: String },
    MissingViewport,
    ImagesMissingAlt { count: usize, images: Vec<String> },
    PageAccessError { message: String },
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::Missing404 => write!(f, "Page returned 404 (broken link)"),
            Finding::MissingH1 => write!(f, "Missing H1 tag"),
            Finding::TitleLengthOutOfRange { length } => write!(
                f,
                "Title ({} chars) is not optimal (should be {}-{} chars)",
                length,
                TITLE_LENGTH.start(),
                TITLE_LENGTH.end()
            ),
            Finding::DescriptionLengthOutOfRange { length } => write!(
                f,
                "Description ({} chars) is not optimal (should be {}-{} chars)",
                length,
                DESCRIPTION_LENGTH.start(),
                DESCRIPTION_LENGTH.end()
            ),
            Finding::CanonicalMissingOrMismatched { observed } => {
                let observed = if observed.is_empty() { "none" } else { observed.as_str() };
                write!(f, "Canonical URL missing or mismatched: {}", observed)
            }
            Finding::MissingViewport => write!(f, "Missing responsive viewport tag"),
            Finding::ImagesMissingAlt { count, .. } => {
                write!(f, "{} image(s) missing alt attribute", count)
            }
            Finding::PageAccessError { message } => {
                write!(f, "Page access/analysis error: {}", message)
            }
        }
    }
}

/// Turns extracted page facts into SEO findings
pub struct PageAuditor;

impl PageAuditor {
    /// Audit one page against the URL it was requested as.
    ///
    /// A 404 yields `Missing404` alone; otherwise every rule runs and findings
    /// come back in rule order.
    pub fn audit(facts: &PageFacts, requested_url: &str) -> Vec<Finding> {
        if facts.status == 404 {
            return vec![Finding::Missing404];
        }

        let mut findings = Vec::new();

        if facts.h1.is_empty() {
            findings.push(Finding::MissingH1);
        }

        let title_length = facts.title.chars().count();
        if !TITLE_LENGTH.contains(&title_length) {
            findings.push(Finding::TitleLengthOutOfRange { length: title_length });
        }

        let description_length = facts.description.chars().count();
        if !DESCRIPTION_LENGTH.contains(&description_length) {
            findings.push(Finding::DescriptionLengthOutOfRange { length: description_length });
        }

        if facts.canonical.is_empty() || facts.canonical.trim() != requested_url.trim() {
            findings.push(Finding::CanonicalMissingOrMismatched {
                observed: facts.canonical.clone(),
            });
        }

        if !facts.viewport.contains(RESPONSIVE_VIEWPORT) {
            findings.push(Finding::MissingViewport);
        }

        if !facts.images_missing_alt.is_empty() {
            findings.push(Finding::ImagesMissingAlt {
                count: facts.images_missing_alt.len(),
                images: facts.images_missing_alt.clone(),
            });
        }

        findings
    }

    /// Finding recorded when the page could not be fetched or analyzed
    pub fn access_error(error: impl fmt::Display) -> Finding {
        Finding::PageAccessError {
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://example.com/post";

    fn clean_facts() -> PageFacts {
        PageFacts {
            status: 200,
            title: "A perfectly sized title".to_string(),
            h1: "Heading".to_string(),
            description: "d".repeat(80),
            canonical: URL.to_string(),
            lang: "en".to_string(),
            viewport: "width=device-width, initial-scale=1".to_string(),
            images: vec!["https://example.com/a.jpg".to_string()],
            images_missing_alt: vec![],
            content: String::new(),
            price: String::new(),
        }
    }

    #[test]
    fn test_clean_page_has_no_findings() {
        assert!(PageAuditor::audit(&clean_facts(), URL).is_empty());
    }

    #[test]
    fn test_404_suppresses_other_checks() {
        let facts = PageFacts { status: 404, ..PageFacts::default() };
        assert_eq!(PageAuditor::audit(&facts, URL), vec![Finding::Missing404]);
    }

    #[test]
    fn test_title_length_boundaries() {
        let mut facts = clean_facts();

        facts.title = "Short".to_string();
        assert_eq!(
            PageAuditor::audit(&facts, URL),
            vec![Finding::TitleLengthOutOfRange { length: 5 }]
        );

        facts.title = "t".repeat(10);
        assert!(PageAuditor::audit(&facts, URL).is_empty());

        facts.title = "t".repeat(70);
        assert!(PageAuditor::audit(&facts, URL).is_empty());

        facts.title = "t".repeat(71);
        assert_eq!(
            PageAuditor::audit(&facts, URL),
            vec![Finding::TitleLengthOutOfRange { length: 71 }]
        );

        // Counted in characters, not bytes
        facts.title = "Máy phát điện".to_string();
        assert!(PageAuditor::audit(&facts, URL).is_empty());

        facts.title = String::new();
        assert_eq!(
            PageAuditor::audit(&facts, URL),
            vec![Finding::TitleLengthOutOfRange { length: 0 }]
        );
    }

    #[test]
    fn test_description_length_boundaries() {
        let mut facts = clean_facts();

        facts.description = "d".repeat(50);
        assert!(PageAuditor::audit(&facts, URL).is_empty());
        facts.description = "d".repeat(160);
        assert!(PageAuditor::audit(&facts, URL).is_empty());

        facts.description = "d".repeat(49);
        assert_eq!(
            PageAuditor::audit(&facts, URL),
            vec![Finding::DescriptionLengthOutOfRange { length: 49 }]
        );
        facts.description = "d".repeat(161);
        assert_eq!(
            PageAuditor::audit(&facts, URL),
            vec![Finding::DescriptionLengthOutOfRange { length: 161 }]
        );
    }

    #[test]
    fn test_canonical_checks() {
        let mut facts = clean_facts();

        facts.canonical = format!("  {}  ", URL);
        assert!(PageAuditor::audit(&facts, URL).is_empty());

        facts.canonical = "https://example.com/other".to_string();
        assert_eq!(
            PageAuditor::audit(&facts, URL),
            vec![Finding::CanonicalMissingOrMismatched { observed: "https://example.com/other".to_string() }]
        );

        facts.canonical = String::new();
        let findings = PageAuditor::audit(&facts, URL);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].to_string(), "Canonical URL missing or mismatched: none");
    }

    #[test]
    fn test_findings_co_occur_in_rule_order() {
        let facts = PageFacts {
            status: 200,
            images_missing_alt: vec!["https://example.com/1.jpg".to_string(), "https://example.com/2.jpg".to_string()],
            ..PageFacts::default()
        };

        let findings = PageAuditor::audit(&facts, URL);
        assert_eq!(findings.len(), 6);
        assert_eq!(findings[0], Finding::MissingH1);
        assert_eq!(findings[1], Finding::TitleLengthOutOfRange { length: 0 });
        assert_eq!(findings[2], Finding::DescriptionLengthOutOfRange { length: 0 });
        assert_eq!(findings[3], Finding::CanonicalMissingOrMismatched { observed: String::new() });
        assert_eq!(findings[4], Finding::MissingViewport);
        assert_eq!(
            findings[5],
            Finding::ImagesMissingAlt {
                count: 2,
                images: vec!["https://example.com/1.jpg".to_string(), "https://example.com/2.jpg".to_string()],
            }
        );
        assert_eq!(findings[5].to_string(), "2 image(s) missing alt attribute");
    }

    #[test]
    fn test_access_error_finding() {
        let finding = PageAuditor::access_error("Timed out after 30s: https://example.com/post");
        assert_eq!(
            finding.to_string(),
            "Page access/analysis error: Timed out after 30s: https://example.com/post"
        );
    }
}
