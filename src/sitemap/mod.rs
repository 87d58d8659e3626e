pub mod reader;
pub mod writer;

// Re-export common types
pub use reader::{DocumentLoader, SitemapReader, SitemapSource};
pub use writer::SitemapWriter;
