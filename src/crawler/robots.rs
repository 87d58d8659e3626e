use async_trait::async_trait;
use reqwest::Client;
use robotstxt::DefaultMatcher;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{CrawlError, Result};

/// Source of robots.txt documents
#[async_trait]
pub trait RobotsFetcher: Send + Sync {
    /// Fetch a robots.txt body. `Ok(None)` means the server answered with a
    /// non-success status.
    async fn fetch_robots(&self, robots_url: &str) -> Result<Option<String>>;
}

/// Fetches robots.txt over HTTP with a short timeout
pub struct HttpRobotsFetcher {
    client: Client,
}

impl HttpRobotsFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| CrawlError::Config(format!("robots HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl RobotsFetcher for HttpRobotsFetcher {
    async fn fetch_robots(&self, robots_url: &str) -> Result<Option<String>> {
        let response = self.client.get(robots_url)
            .send()
            .await
            .map_err(|e| CrawlError::transport(robots_url, e))?;

        if !response.status().is_success() {
            warn!("robots.txt at {} returned {}", robots_url, response.status());
            return Ok(None);
        }

        let body = response.text()
            .await
            .map_err(|e| CrawlError::transport(robots_url, e))?;

        Ok(Some(body))
    }
}

/// Rules from one origin's robots.txt
#[derive(Debug, Clone)]
pub struct RobotsRuleset {
    body: String,
}

impl RobotsRuleset {
    pub fn new(body: String) -> Self {
        Self { body }
    }

    /// True when any of the agents may fetch the URL
    pub fn allows(&self, url: &str, agents: &[String]) -> bool {
        // robotstxt exposes no parsed ruleset, each check re-reads the body
        agents.iter().any(|agent| {
            let mut matcher = DefaultMatcher::default();
            matcher.one_agent_allowed_by_robots(&self.body, agent, url)
        })
    }
}

/// Answers robots.txt allow/deny per URL, fetching each origin's rules once.
///
/// An origin whose robots.txt could not be fetched is cached as having no
/// rules, and every URL on it is allowed.
pub struct RobotsGate {
    fetcher: Arc<dyn RobotsFetcher>,

    /// Keyed by origin; `None` marks an origin without usable rules
    cache: HashMap<String, Option<RobotsRuleset>>,
}

impl RobotsGate {
    pub fn new(fetcher: Arc<dyn RobotsFetcher>) -> Self {
        Self {
            fetcher,
            cache: HashMap::new(),
        }
    }

    pub async fn is_allowed(&mut self, url: &str, agents: &[String]) -> bool {
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Cannot check robots.txt for {} ({}), treating as allowed", url, e);
                return true;
            }
        };

        let origin = parsed.origin();
        if !origin.is_tuple() {
            return true;
        }
        let origin = origin.ascii_serialization();

        if !self.cache.contains_key(&origin) {
            let rules = self.load(&origin).await;
            self.cache.insert(origin.clone(), rules);
        }

        match self.cache.get(&origin) {
            Some(Some(rules)) => rules.allows(url, agents),
            _ => true,
        }
    }

    async fn load(&self, origin: &str) -> Option<RobotsRuleset> {
        let robots_url = format!("{}/robots.txt", origin);
        info!("Fetching robots.txt from: {}", robots_url);

        match self.fetcher.fetch_robots(&robots_url).await {
            Ok(Some(body)) => {
                debug!("Loaded robots.txt for {} ({} bytes)", origin, body.len());
                Some(RobotsRuleset::new(body))
            }
            Ok(None) => {
                warn!("No usable robots.txt for {}, allowing all URLs", origin);
                None
            }
            Err(e) => {
                warn!("Failed to fetch robots.txt for {}: {}. Allowing all URLs", origin, e);
                None
            }
        }
    }

    /// Number of origins with a cached answer
    #[cfg(test)]
    pub fn cached_origins(&self) -> usize {
        self.cache.len()
    }
}
