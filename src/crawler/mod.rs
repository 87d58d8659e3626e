pub mod delay;
pub mod frontier;
pub mod orchestrator;
pub mod robots;
pub mod scope;

// Re-export common types
pub use delay::JitterDelay;
pub use orchestrator::{Collaborators, CrawlOrchestrator, RunOutcome};
pub use robots::HttpRobotsFetcher;
