use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use crate::browser::{PageFetcher, RenderedPage};
use crate::cli::config::CrawlerConfig;
use crate::crawler::delay::Delay;
use crate::crawler::frontier::Frontier;
use crate::crawler::robots::{RobotsFetcher, RobotsGate};
use crate::crawler::scope::CrawlScope;
use crate::error::{CrawlError, Result};
use crate::seo::{CrawlReport, Finding, PageAuditor};
use crate::sitemap::{SitemapReader, SitemapSource, SitemapWriter};
use crate::storage::{ImageArchiver, PageRecord, PageStore};
use crate::utils::PhaseMetrics;

/// Where a run currently stands. Phases only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlState {
    Phase1Seeding,
    Phase1Crawling,
    Phase1Writing,
    Phase2Seeding,
    Phase2Crawling,
    Phase2Reporting,
    Done,
}

/// How a run ended
#[derive(Debug)]
pub enum RunOutcome {
    /// Both phases ran and the report was written
    Completed {
        sitemap_path: PathBuf,
        report_path: PathBuf,
        report: CrawlReport,
    },

    /// Only the sitemap was requested
    SitemapWritten {
        sitemap_path: PathBuf,
        url_count: usize,
    },

    /// A phase produced no URLs, so the remaining phases were skipped
    Aborted { reason: String },
}

/// I/O collaborators the orchestrator drives
pub struct Collaborators {
    pub fetcher: Arc<dyn PageFetcher>,
    pub store: Arc<dyn PageStore>,
    pub robots: Arc<dyn RobotsFetcher>,
    pub sitemaps: Arc<dyn SitemapSource>,
    pub delay: Arc<dyn Delay>,
}

/// Drives the sitemap generation phase and the SEO analysis phase over a
/// single site, one page at a time.
pub struct CrawlOrchestrator {
    config: CrawlerConfig,
    scope: CrawlScope,
    robots: RobotsGate,
    fetcher: Arc<dyn PageFetcher>,
    store: Arc<dyn PageStore>,
    sitemaps: Arc<dyn SitemapSource>,
    delay: Arc<dyn Delay>,
    images: Option<ImageArchiver>,

    /// Host name of the start URL, as shown in the report
    host: String,

    /// Output folder for this site's artifacts
    site_dir: PathBuf,

    run_id: String,
    state: CrawlState,
}

/// Host of `url` with any leading "www." removed
fn domain_of(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    host.strip_prefix("www.").unwrap_or(host).to_string()
}

impl CrawlOrchestrator {
    pub fn new(config: CrawlerConfig, collaborators: Collaborators) -> Result<Self> {
        let start = Url::parse(&config.crawl.start_url)
            .map_err(|e| CrawlError::InvalidUrl(format!("{}: {}", config.crawl.start_url, e)))?;
        let scope = CrawlScope::new(&config.crawl.start_url)?;
        let host = start.host_str().unwrap_or_default().to_string();
        let site_dir = config.output.dir.join(domain_of(&start));

        let images = if config.images.download {
            Some(ImageArchiver::new(
                site_dir.clone(),
                config.images.max_per_page,
                &config.crawl.user_agent,
                Duration::from_secs(config.images.timeout_secs),
            )?)
        } else {
            None
        };

        Ok(Self {
            config,
            scope,
            robots: RobotsGate::new(collaborators.robots),
            fetcher: collaborators.fetcher,
            store: collaborators.store,
            sitemaps: collaborators.sitemaps,
            delay: collaborators.delay,
            images,
            host,
            site_dir,
            run_id: Uuid::new_v4().to_string(),
            state: CrawlState::Phase1Seeding,
        })
    }

    pub fn state(&self) -> CrawlState {
        self.state
    }

    fn transition(&mut self, next: CrawlState) {
        debug!("Crawl state {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    fn abort(&mut self, reason: &str) -> RunOutcome {
        warn!("Run aborted: {}", reason);
        self.transition(CrawlState::Done);
        RunOutcome::Aborted {
            reason: reason.to_string(),
        }
    }

    /// Run both phases: generate a sitemap by crawling outward from the start
    /// URL, then audit every page listed in it
    pub async fn run(&mut self) -> Result<RunOutcome> {
        info!("Starting run {} for {}", self.run_id, self.config.crawl.start_url);
        self.prepare().await?;

        if self.config.storage.clear_on_start {
            self.clear_collections().await;
        }

        let Some(sitemap_path) = self.build_sitemap().await? else {
            return Ok(self.abort("no article pages were reached, sitemap not written"));
        };

        self.analyze_sitemap(&sitemap_path).await
    }

    /// Run the sitemap generation phase only
    pub async fn generate_sitemap(&mut self) -> Result<RunOutcome> {
        self.prepare().await?;

        match self.build_sitemap().await? {
            Some(sitemap_path) => {
                self.transition(CrawlState::Done);
                let url_count = self.read_sitemap(&sitemap_path).await.len();
                Ok(RunOutcome::SitemapWritten { sitemap_path, url_count })
            }
            None => Ok(self.abort("no article pages were reached, sitemap not written")),
        }
    }

    async fn prepare(&mut self) -> Result<()> {
        tokio::fs::create_dir_all(&self.site_dir).await?;
        info!("Writing output to {}", self.site_dir.display());

        if self.config.crawl.check_existing_sitemap {
            self.check_existing_sitemap().await;
        }
        Ok(())
    }

    async fn clear_collections(&self) {
        let collections = [
            self.config.storage.pages_collection.as_str(),
            self.config.storage.summary_collection.as_str(),
        ];

        for name in collections {
            match self.store.clear_collection(name).await {
                Ok(()) => debug!("Cleared collection {}", name),
                Err(e) => warn!("Could not clear collection {}: {}", name, e),
            }
        }
    }

    /// Report how many articles the site's own sitemap lists. The URLs are
    /// only logged for comparison and never crawled.
    async fn check_existing_sitemap(&self) {
        let Ok(start) = Url::parse(&self.config.crawl.start_url) else {
            return;
        };
        let location = format!("{}/sitemap.xml", start.origin().ascii_serialization());

        let reader = SitemapReader::new(self.sitemaps.clone(), self.scope.clone());
        let urls = reader.read_urls(&location).await;
        if urls.is_empty() {
            info!("No usable existing sitemap at {}", location);
        } else {
            info!("Existing sitemap {} lists {} article URLs (reference only)", location, urls.len());
        }
    }

    async fn read_sitemap(&self, sitemap_path: &Path) -> Vec<String> {
        let reader = SitemapReader::new(self.sitemaps.clone(), self.scope.clone());
        reader.read_urls(&sitemap_path.to_string_lossy()).await
    }

    /// Fetch one page, bounded by the configured page timeout
    async fn fetch_page(&self, url: &str) -> Result<RenderedPage> {
        let secs = self.config.crawl.page_timeout_secs;
        match tokio::time::timeout(Duration::from_secs(secs), self.fetcher.fetch(url)).await {
            Ok(result) => result,
            Err(_) => Err(CrawlError::Timeout {
                url: url.to_string(),
                secs,
            }),
        }
    }

    /// Crawl outward from the start URL and collect the article pages that
    /// answered with anything but 404. The phase frontier is handed back so
    /// the caller can report what was left pending.
    async fn discover(&mut self) -> (Vec<String>, Frontier) {
        self.transition(CrawlState::Phase1Seeding);
        let max_pages = self.config.crawl.max_sitemap_pages;
        let agents = self.config.crawl.robots_agents.clone();
        let mut frontier = Frontier::seeded([self.config.crawl.start_url.as_str()]);
        let mut metrics = PhaseMetrics::new("Sitemap generation");
        let mut candidates = Vec::new();
        let mut crawled = 0;

        info!("Crawling from {} to build a new sitemap (max {} pages)", self.config.crawl.start_url, max_pages);
        self.transition(CrawlState::Phase1Crawling);

        while crawled < max_pages {
            let Ok(url) = frontier.next() else {
                break;
            };

            if frontier.is_visited(&url) {
                debug!("[Sitemap] Already processed: {}", url);
                continue;
            }

            if !self.robots.is_allowed(&url, &agents).await {
                info!("[Sitemap] Blocked by robots.txt: {}", url);
                metrics.record_robots_skip();
                frontier.mark_visited(&url);
                continue;
            }

            let timer = metrics.start_timer();
            match self.fetch_page(&url).await {
                Ok(page) => {
                    let status = page.facts.status;
                    metrics.record_fetch(status, timer.end());

                    if status != 404 && self.scope.is_article_url(&url) {
                        info!("[Sitemap] Reached ({}): {}", status, url);
                        candidates.push(url.clone());
                    } else {
                        debug!("[Sitemap] Not a sitemap entry ({}): {}", status, url);
                    }

                    frontier.mark_visited(&url);
                    let queued = self
                        .scope
                        .discovered_candidates(&page.url, &page.links)
                        .iter()
                        .filter(|link| frontier.add(link))
                        .count();
                    debug!("[Sitemap] Queued {} new links from {}", queued, url);
                }
                Err(e) => {
                    metrics.record_failure(timer.end());
                    warn!("[Sitemap] Failed to fetch {}: {}", url, e);
                    frontier.mark_visited(&url);
                }
            }
            crawled += 1;

            self.delay.wait().await;
        }

        metrics.log_summary();
        (candidates, frontier)
    }

    /// Phase 1. Returns `None` when no page qualified for the sitemap.
    async fn build_sitemap(&mut self) -> Result<Option<PathBuf>> {
        let (candidates, frontier) = self.discover().await;
        info!(
            "Reached {} article pages for the new sitemap ({} URLs processed, {} left pending)",
            candidates.len(),
            frontier.visited_count(),
            frontier.size()
        );

        self.transition(CrawlState::Phase1Writing);
        let destination = self.site_dir.join(&self.config.output.sitemap_filename);
        match SitemapWriter::write(&candidates, &destination).await {
            Ok(path) => Ok(Some(path)),
            Err(CrawlError::EmptyResult(reason)) => {
                warn!("Sitemap not written: {}", reason);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Phase 2: audit every page listed in the sitemap at `sitemap_path`,
    /// write the text report and store its summary
    pub async fn analyze_sitemap(&mut self, sitemap_path: &Path) -> Result<RunOutcome> {
        self.transition(CrawlState::Phase2Seeding);
        let max_pages = self.config.crawl.max_analyze_pages;

        let mut urls = self.read_sitemap(sitemap_path).await;
        if urls.is_empty() {
            return Ok(self.abort("the generated sitemap lists no usable URLs"));
        }
        if urls.len() > max_pages {
            info!("Analyzing the first {} of {} sitemap URLs", max_pages, urls.len());
            urls.truncate(max_pages);
        }

        let sitemap_name = sitemap_path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| sitemap_path.display().to_string());
        let mut report = CrawlReport::new(&self.run_id, &self.host, &sitemap_name);
        let mut frontier = Frontier::seeded(&urls);
        let mut metrics = PhaseMetrics::new("SEO analysis");
        let agents = self.config.crawl.robots_agents.clone();
        let mut analyzed = 0;

        info!("Analyzing {} URLs from {}", frontier.size(), sitemap_name);
        self.transition(CrawlState::Phase2Crawling);

        while analyzed < max_pages {
            let Ok(url) = frontier.next() else {
                break;
            };

            if frontier.is_visited(&url) {
                debug!("[SEO] Already analyzed: {}", url);
                continue;
            }

            if !self.robots.is_allowed(&url, &agents).await {
                info!("[SEO] Blocked by robots.txt: {}", url);
                metrics.record_robots_skip();
                report.record_skipped(&url);
                frontier.mark_visited(&url);
                continue;
            }

            let timer = metrics.start_timer();
            let findings = match self.fetch_page(&url).await {
                Ok(page) => {
                    metrics.record_fetch(page.facts.status, timer.end());
                    let findings = PageAuditor::audit(&page.facts, &url);
                    info!("[SEO] {} ({}): {} findings", url, page.facts.status, findings.len());
                    self.persist_page(&url, &page, &findings).await;
                    findings
                }
                Err(e) => {
                    metrics.record_failure(timer.end());
                    warn!("[SEO] Failed to analyze {}: {}", url, e);
                    vec![PageAuditor::access_error(&e)]
                }
            };

            report.record(&url, findings);
            frontier.mark_visited(&url);
            analyzed += 1;

            self.delay.wait().await;
        }

        metrics.log_summary();

        self.transition(CrawlState::Phase2Reporting);
        report.finalize();
        let report_path = report
            .write_text(&self.site_dir.join(&self.config.output.report_filename))
            .await?;

        if let Err(e) = self.store.insert_report_summary(&report.summary()).await {
            warn!("Could not store report summary: {}", e);
        }

        self.transition(CrawlState::Done);
        info!(
            "Analysis complete: {} pages, {} returning 404, {} images missing alt",
            report.total_analyzed, report.total_404, report.total_missing_alt_images
        );

        Ok(RunOutcome::Completed {
            sitemap_path: sitemap_path.to_path_buf(),
            report_path,
            report,
        })
    }

    /// Archive images and store the page record. Pages returning 404 are
    /// not stored. Failures are logged only.
    async fn persist_page(&self, url: &str, page: &RenderedPage, findings: &[Finding]) {
        if page.facts.status == 404 {
            debug!("[SEO] Not storing 404 page: {}", url);
            return;
        }

        let images = match &self.images {
            Some(archiver) => archiver.archive(url, &page.facts.images).await,
            None => Vec::new(),
        };

        let record = PageRecord::new(&self.run_id, url, &page.facts, images, findings);
        if let Err(e) = self.store.insert_page_record(&record).await {
            warn!("Could not store page record for {}: {}", url, e);
        }
    }
}
