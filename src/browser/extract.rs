use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::browser::{PageFacts, RenderedPage};

/// Parse a CSS selector that is known at compile time
fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

/// Collapse runs of whitespace the way the DOM's innerText roughly does
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

fn first_element<'a>(document: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    let selector = selector(css)?;
    document.select(&selector).next()
}

fn first_text(document: &Html, css: &str) -> String {
    first_element(document, css).map(element_text).unwrap_or_default()
}

fn first_attr(document: &Html, css: &str, attr: &str) -> String {
    first_element(document, css)
        .and_then(|element| element.value().attr(attr))
        .unwrap_or_default()
        .to_string()
}

/// Resolve a possibly relative reference against the page URL
fn resolve(base: Option<&Url>, reference: &str) -> Option<String> {
    match Url::parse(reference) {
        Ok(url) => Some(url.to_string()),
        Err(_) => base?.join(reference).ok().map(|url| url.to_string()),
    }
}

/// Extract SEO facts and links from an HTML document
pub fn extract_page(html: &str, page_url: &str, status: u16) -> RenderedPage {
    let document = Html::parse_document(html);
    let base = Url::parse(page_url).ok();

    let canonical = first_element(&document, "link[rel='canonical']")
        .and_then(|element| element.value().attr("href"))
        .and_then(|href| resolve(base.as_ref(), href.trim()))
        .unwrap_or_default();

    let mut images = Vec::new();
    let mut images_missing_alt = Vec::new();
    if let Some(img) = selector("img") {
        for element in document.select(&img) {
            let src = element.value().attr("src")
                .and_then(|src| resolve(base.as_ref(), src.trim()))
                .unwrap_or_default();
            let has_alt = element.value().attr("alt").map_or(false, |alt| !alt.trim().is_empty());
            if !has_alt {
                images_missing_alt.push(src.clone());
            }
            images.push(src);
        }
    }

    // Prefer the most specific content container
    let content = ["article", "main", "body"]
        .iter()
        .find_map(|css| first_element(&document, css))
        .map(element_text)
        .unwrap_or_default();

    let facts = PageFacts {
        status,
        title: first_text(&document, "title"),
        h1: first_text(&document, "h1"),
        description: first_attr(&document, "meta[name='description']", "content"),
        canonical,
        lang: first_attr(&document, "html", "lang"),
        viewport: first_attr(&document, "meta[name='viewport']", "content"),
        images,
        images_missing_alt,
        content,
        price: first_text(&document, ".price, [itemprop='price']"),
    };

    RenderedPage {
        url: page_url.to_string(),
        facts,
        links: extract_links(&document, base.as_ref()),
    }
}

/// Absolute http(s) targets of every anchor on the page
fn extract_links(document: &Html, base: Option<&Url>) -> Vec<String> {
    let Some(anchors) = selector("a[href]") else {
        return Vec::new();
    };

    document
        .select(&anchors)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve(base, href.trim()))
        .filter(|url| url.starts_with("http://") || url.starts_with("https://"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
<html lang="vi">
<head>
  <title>  Generator maintenance
     guide </title>
  <meta name="description" content="How to keep a diesel generator healthy.">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <link rel="canonical" href="/guides/maintenance">
</head>
<body>
  <h1>Maintenance <em>guide</em></h1>
  <article>Check the oil weekly.</article>
  <span itemprop="price"> 12.000.000 </span>
  <img src="/img/a.jpg" alt="Generator">
  <img src="/img/b.jpg" alt="  ">
  <img src="https://cdn.example.net/c.png">
  <a href="/guides/next#top">Next</a>
  <a href="mailto:me@example.com">Mail</a>
  <a href="https://other.org/x">Other</a>
</body>
</html>"#;

    #[test]
    fn test_extract_page() {
        let page = extract_page(PAGE, "https://example.com/guides/maintenance", 200);
        let facts = &page.facts;

        assert_eq!(facts.status, 200);
        assert_eq!(facts.title, "Generator maintenance guide");
        assert_eq!(facts.h1, "Maintenance guide");
        assert_eq!(facts.description, "How to keep a diesel generator healthy.");
        assert_eq!(facts.canonical, "https://example.com/guides/maintenance");
        assert_eq!(facts.lang, "vi");
        assert!(facts.viewport.contains("width=device-width"));
        assert_eq!(facts.images.len(), 3);
        assert_eq!(
            facts.images_missing_alt,
            vec!["https://example.com/img/b.jpg", "https://cdn.example.net/c.png"]
        );
        assert_eq!(facts.content, "Check the oil weekly.");
        assert_eq!(facts.price, "12.000.000");

        assert_eq!(
            page.links,
            vec!["https://example.com/guides/next#top", "https://other.org/x"]
        );
    }

    #[test]
    fn test_extract_empty_document() {
        let page = extract_page("", "https://example.com/a", 200);
        assert!(page.facts.title.is_empty());
        assert!(page.facts.h1.is_empty());
        assert!(page.facts.canonical.is_empty());
        assert!(page.facts.images.is_empty());
        assert!(page.links.is_empty());
    }
}
