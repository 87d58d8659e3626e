use std::collections::{HashSet, VecDeque};
use tracing::debug;

use crate::crawler::scope::normalize_url;
use crate::error::{CrawlError, Result};

/// FIFO frontier for a single crawl phase.
///
/// A URL is admitted once per phase: after it has been queued it is never
/// queued again, whether it is still pending, dequeued or visited. Each phase
/// builds its own frontier, so nothing carries over between phases. The page
/// budget is enforced by the caller.
#[derive(Debug, Default)]
pub struct Frontier {
    /// Pending URLs in discovery order
    pending: VecDeque<String>,

    /// Every URL admitted during this phase
    seen: HashSet<String>,

    /// URLs already processed during this phase
    visited: HashSet<String>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a frontier from seed URLs, keeping their order
    pub fn seeded<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut frontier = Self::new();
        for url in urls {
            frontier.add(url.as_ref());
        }
        frontier
    }

    /// Queue a URL unless it was already admitted this phase. Returns whether
    /// it was queued; duplicates and unparseable URLs are silently ignored.
    pub fn add(&mut self, url: &str) -> bool {
        let key = match normalize_url(url) {
            Ok(key) => key,
            Err(e) => {
                debug!("Not queueing {}", e);
                return false;
            }
        };

        if self.seen.contains(&key) || self.visited.contains(&key) {
            return false;
        }

        self.seen.insert(key.clone());
        self.pending.push_back(key);
        true
    }

    /// Remove and return the oldest pending URL
    pub fn next(&mut self) -> Result<String> {
        self.pending.pop_front().ok_or(CrawlError::EmptyFrontier)
    }

    /// Record a URL as processed for this phase
    pub fn mark_visited(&mut self, url: &str) {
        let key = normalize_url(url).unwrap_or_else(|_| url.to_string());
        self.seen.insert(key.clone());
        self.visited.insert(key);
    }

    pub fn is_visited(&self, url: &str) -> bool {
        match normalize_url(url) {
            Ok(key) => self.visited.contains(&key),
            Err(_) => self.visited.contains(url),
        }
    }

    /// Number of pending URLs
    pub fn size(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Whether the URL was ever queued or visited this phase
    #[cfg(test)]
    pub fn was_admitted(&self, url: &str) -> bool {
        normalize_url(url).map_or(false, |key| self.seen.contains(&key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_is_idempotent() {
        let mut frontier = Frontier::new();

        assert!(frontier.add("https://example.com/a"));
        assert!(!frontier.add("https://example.com/a"));
        assert!(!frontier.add("https://example.com/a#top"));
        assert_eq!(frontier.size(), 1);

        let url = frontier.next().unwrap();
        assert_eq!(url, "https://example.com/a");

        // Dequeued URLs are never queued again this phase
        assert!(!frontier.add("https://example.com/a"));
        frontier.mark_visited(&url);
        assert!(!frontier.add("https://example.com/a"));
        assert_eq!(frontier.size(), 0);
        assert!(frontier.is_visited("https://example.com/a"));
    }

    #[test]
    fn test_fifo_order() {
        let mut frontier = Frontier::seeded(["https://example.com/1", "https://example.com/2"]);
        frontier.add("https://example.com/3");

        assert_eq!(frontier.next().unwrap(), "https://example.com/1");
        assert_eq!(frontier.next().unwrap(), "https://example.com/2");
        assert_eq!(frontier.next().unwrap(), "https://example.com/3");
        assert!(matches!(frontier.next(), Err(CrawlError::EmptyFrontier)));
    }

    #[test]
    fn test_invalid_url_is_ignored() {
        let mut frontier = Frontier::new();
        assert!(!frontier.add("javascript-void"));
        assert!(frontier.is_empty());
    }

    #[test]
    fn test_fresh_frontier_per_phase() {
        let mut first = Frontier::seeded(["https://example.com/a"]);
        let url = first.next().unwrap();
        first.mark_visited(&url);

        let mut second = Frontier::new();
        assert!(second.add("https://example.com/a"));
        assert_eq!(first.visited_count(), 1);
        assert_eq!(second.visited_count(), 0);
    }
}
