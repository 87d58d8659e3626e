use std::collections::BTreeMap;
use std::time::Instant;
use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use tracing::info;

/// Counters for one crawl phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseMetrics {
    /// Phase label used in the log line
    pub phase: String,

    pub start_time: DateTime<Utc>,

    /// Pages that returned a response
    pub pages_fetched: usize,

    /// Fetches that ended in an error or timeout
    pub failures: usize,

    /// URLs skipped because robots.txt disallowed them
    pub robots_skipped: usize,

    /// Response status counts
    pub status_codes: BTreeMap<u16, usize>,

    /// Fetch durations in milliseconds
    pub durations_ms: Vec<u64>,
}

impl PhaseMetrics {
    pub fn new(phase: &str) -> Self {
        Self {
            phase: phase.to_string(),
            start_time: Utc::now(),
            pages_fetched: 0,
            failures: 0,
            robots_skipped: 0,
            status_codes: BTreeMap::new(),
            durations_ms: Vec::new(),
        }
    }

    pub fn record_fetch(&mut self, status: u16, duration_ms: u64) {
        self.pages_fetched += 1;
        *self.status_codes.entry(status).or_default() += 1;
        self.durations_ms.push(duration_ms);
    }

    pub fn record_failure(&mut self, duration_ms: u64) {
        self.failures += 1;
        self.durations_ms.push(duration_ms);
    }

    pub fn record_robots_skip(&mut self) {
        self.robots_skipped += 1;
    }

    pub fn average_duration_ms(&self) -> u64 {
        if self.durations_ms.is_empty() {
            return 0;
        }
        self.durations_ms.iter().sum::<u64>() / self.durations_ms.len() as u64
    }

    /// Start timing a fetch
    pub fn start_timer(&self) -> RequestTimer {
        RequestTimer {
            start: Instant::now(),
        }
    }

    /// Emit the phase summary line
    pub fn log_summary(&self) {
        let elapsed = (Utc::now() - self.start_time).num_seconds();
        info!(
            "{} finished in {}s: {} fetched, {} failed, {} blocked by robots.txt, avg {} ms, status codes {:?}",
            self.phase,
            elapsed,
            self.pages_fetched,
            self.failures,
            self.robots_skipped,
            self.average_duration_ms(),
            self.status_codes
        );
    }
}

/// Request timer for measuring fetch durations
pub struct RequestTimer {
    start: Instant,
}

impl RequestTimer {
    /// End timing and get the duration in milliseconds
    pub fn end(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_counters() {
        let mut metrics = PhaseMetrics::new("analysis");
        metrics.record_fetch(200, 100);
        metrics.record_fetch(404, 300);
        metrics.record_fetch(200, 200);
        metrics.record_failure(400);
        metrics.record_robots_skip();

        assert_eq!(metrics.pages_fetched, 3);
        assert_eq!(metrics.failures, 1);
        assert_eq!(metrics.robots_skipped, 1);
        assert_eq!(metrics.status_codes.get(&200), Some(&2));
        assert_eq!(metrics.status_codes.get(&404), Some(&1));
        assert_eq!(metrics.average_duration_ms(), 250);
    }

    #[test]
    fn test_empty_average() {
        assert_eq!(PhaseMetrics::new("discovery").average_duration_ms(), 0);
    }
}
