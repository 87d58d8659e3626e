use chrono::{NaiveDate, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{CrawlError, Result};

const SITEMAP_NAMESPACE: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";
const CHANGE_FREQ: &str = "daily";
const PRIORITY: &str = "0.7";

fn write_text_element<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// Render a urlset document, one `<url>` per entry in input order
pub fn render_sitemap(urls: &[String], lastmod: NaiveDate) -> Result<String> {
    let lastmod = lastmod.format("%Y-%m-%d").to_string();
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 4);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Start(BytesStart::new("urlset").with_attributes([("xmlns", SITEMAP_NAMESPACE)])))?;

    for url in urls {
        writer.write_event(Event::Start(BytesStart::new("url")))?;
        write_text_element(&mut writer, "loc", url)?;
        write_text_element(&mut writer, "lastmod", &lastmod)?;
        write_text_element(&mut writer, "changefreq", CHANGE_FREQ)?;
        write_text_element(&mut writer, "priority", PRIORITY)?;
        writer.write_event(Event::End(BytesEnd::new("url")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("urlset")))?;

    let mut document = String::from_utf8(writer.into_inner())
        .map_err(|e| CrawlError::parse("generated sitemap", e))?;
    document.push('\n');
    Ok(document)
}

/// Writes generated sitemaps to disk
pub struct SitemapWriter;

impl SitemapWriter {
    /// Write `urls` to `destination` with today's UTC date as lastmod.
    /// An empty URL list is refused with `EmptyResult`.
    pub async fn write(urls: &[String], destination: &Path) -> Result<PathBuf> {
        if urls.is_empty() {
            return Err(CrawlError::EmptyResult(
                "no URLs were crawled successfully, refusing to write an empty sitemap".to_string(),
            ));
        }

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let document = render_sitemap(urls, Utc::now().date_naive())?;
        tokio::fs::write(destination, document).await?;

        info!("Wrote sitemap with {} URLs: {}", urls.len(), destination.display());
        Ok(destination.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sitemap::reader::parse_sitemap;

    #[test]
    fn test_render_sitemap() {
        let urls = vec![
            "https://example.com/b".to_string(),
            "https://example.com/a?x=1&y=2".to_string(),
        ];
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let xml = render_sitemap(&urls, date).unwrap();

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">"));
        assert_eq!(xml.matches("<url>").count(), 2);
        assert_eq!(xml.matches("<lastmod>2024-03-09</lastmod>").count(), 2);
        assert_eq!(xml.matches("<changefreq>daily</changefreq>").count(), 2);
        assert_eq!(xml.matches("<priority>0.7</priority>").count(), 2);
        assert!(xml.contains("<loc>https://example.com/a?x=1&amp;y=2</loc>"));

        // Input order is preserved
        let b = xml.find("example.com/b").unwrap();
        let a = xml.find("example.com/a").unwrap();
        assert!(b < a);

        let parsed = parse_sitemap(&xml, "generated").unwrap();
        assert_eq!(parsed.urls, urls);
    }

    #[tokio::test]
    async fn test_write_refuses_empty() {
        let dir = tempfile::tempdir().unwrap();
        let result = SitemapWriter::write(&[], &dir.path().join("sitemap.xml")).await;
        assert!(matches!(result, Err(CrawlError::EmptyResult(_))));
        assert!(!dir.path().join("sitemap.xml").exists());
    }

    #[tokio::test]
    async fn test_write_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("example.com").join("sitemap.xml");
        let urls = vec!["https://example.com/post".to_string()];

        let path = SitemapWriter::write(&urls, &destination).await.unwrap();
        assert_eq!(path, destination);

        let written = std::fs::read_to_string(&path).unwrap();
        let today = Utc::now().date_naive().format("%Y-%m-%d").to_string();
        assert!(written.contains(&format!("<lastmod>{}</lastmod>", today)));
    }
}
