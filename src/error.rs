use thiserror::Error;

/// Errors raised while crawling and auditing a site.
///
/// Only `EmptyResult` is fatal to a run; everything else is recovered at the
/// page or source that produced it.
#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("Transport error for {url}: {message}")]
    Transport { url: String, message: String },

    #[error("Timed out after {secs}s: {url}")]
    Timeout { url: String, secs: u64 },

    #[error("Parse error in {source_name}: {message}")]
    Parse { source_name: String, message: String },

    #[error("No usable URLs: {0}")]
    EmptyResult(String),

    #[error("Frontier is empty")]
    EmptyFrontier,

    #[error("Store error: {0}")]
    Store(String),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CrawlError {
    pub fn transport(url: &str, err: impl std::fmt::Display) -> Self {
        CrawlError::Transport {
            url: url.to_string(),
            message: err.to_string(),
        }
    }

    pub fn parse(source_name: &str, err: impl std::fmt::Display) -> Self {
        CrawlError::Parse {
            source_name: source_name.to_string(),
            message: err.to_string(),
        }
    }
}

impl From<mongodb::error::Error> for CrawlError {
    fn from(err: mongodb::error::Error) -> Self {
        CrawlError::Store(err.to_string())
    }
}

impl From<thirtyfour::error::WebDriverError> for CrawlError {
    fn from(err: thirtyfour::error::WebDriverError) -> Self {
        CrawlError::Browser(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CrawlError>;
