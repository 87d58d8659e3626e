pub mod audit;
pub mod report;

// Re-export common types
pub use audit::{Finding, PageAuditor};
pub use report::{CrawlReport, ReportSummary};
