use anyhow::{Result, Context};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::browser::{BrowserPageFetcher, HttpPageFetcher, PageFetcher};
use crate::cli::config::{CrawlerConfig, FetcherKind};
use crate::cli::CrawlArgs;
use crate::crawler::{Collaborators, CrawlOrchestrator, HttpRobotsFetcher, JitterDelay, RunOutcome};
use crate::sitemap::DocumentLoader;
use crate::storage::{MongoPageStore, NullStore, PageStore};

/// Generate a sitemap for the site, then audit every page in it
pub async fn run(url: String, args: CrawlArgs) -> Result<()> {
    let config = load_config(url, &args)?;
    let (mut orchestrator, fetcher) = build_orchestrator(config).await?;

    let outcome = orchestrator.run().await;
    close_fetcher(fetcher).await;

    print_outcome(&outcome?);
    Ok(())
}

/// Crawl the site and write a new sitemap without auditing
pub async fn sitemap(url: String, args: CrawlArgs) -> Result<()> {
    let config = load_config(url, &args)?;
    let (mut orchestrator, fetcher) = build_orchestrator(config).await?;

    let outcome = orchestrator.generate_sitemap().await;
    close_fetcher(fetcher).await;

    print_outcome(&outcome?);
    Ok(())
}

/// Resolve the configuration for a run: file, profile or default, then the
/// command line overrides
fn load_config(url: String, args: &CrawlArgs) -> Result<CrawlerConfig> {
    let mut config = if let Some(path) = &args.config {
        CrawlerConfig::load_from_file(path)?
    } else if let Some(profile) = &args.profile {
        CrawlerConfig::load_profile(profile)
            .context(format!("Failed to load profile: {}", profile))?
    } else {
        CrawlerConfig::load_default()?
    };

    config.crawl.start_url = url;
    args.apply(&mut config);
    config.validate()?;

    Ok(config)
}

async fn build_orchestrator(config: CrawlerConfig) -> Result<(CrawlOrchestrator, Arc<dyn PageFetcher>)> {
    let user_agent = config.crawl.user_agent.clone();
    let page_timeout = Duration::from_secs(config.crawl.page_timeout_secs);

    let fetcher: Arc<dyn PageFetcher> = match config.browser.fetcher {
        FetcherKind::Browser => Arc::new(
            BrowserPageFetcher::connect(&config.browser, &user_agent, page_timeout)
                .await
                .context(format!("Failed to start a browser session at {}", config.browser.webdriver_url))?,
        ),
        FetcherKind::Http => Arc::new(HttpPageFetcher::new(&user_agent, page_timeout)?),
    };

    let store: Arc<dyn PageStore> = if config.storage.enabled {
        match MongoPageStore::connect(&config.storage).await {
            Ok(store) => Arc::new(store),
            Err(e) => {
                warn!("Storage unavailable, continuing without it: {}", e);
                Arc::new(NullStore)
            }
        }
    } else {
        info!("Storage disabled");
        Arc::new(NullStore)
    };

    let robots = HttpRobotsFetcher::new(&user_agent, Duration::from_secs(config.crawl.robots_timeout_secs))?;
    let sitemaps = DocumentLoader::new(&user_agent, Duration::from_secs(config.crawl.sitemap_timeout_secs))?;
    let (min_delay, max_delay) = config.crawl.politeness_delay;

    let orchestrator = CrawlOrchestrator::new(
        config,
        Collaborators {
            fetcher: fetcher.clone(),
            store,
            robots: Arc::new(robots),
            sitemaps: Arc::new(sitemaps),
            delay: Arc::new(JitterDelay::new(min_delay, max_delay)),
        },
    )?;

    Ok((orchestrator, fetcher))
}

async fn close_fetcher(fetcher: Arc<dyn PageFetcher>) {
    if let Err(e) = fetcher.close().await {
        warn!("Failed to close page fetcher: {}", e);
    }
}

fn print_outcome(outcome: &RunOutcome) {
    match outcome {
        RunOutcome::Completed { sitemap_path, report_path, report } => {
            println!("Sitemap: {}", sitemap_path.display());
            println!("Report: {}", report_path.display());
            println!("URLs analyzed: {}", report.total_analyzed);
            println!("Pages returning 404: {}", report.total_404);
            println!("Images missing alt: {}", report.total_missing_alt_images);
        },
        RunOutcome::SitemapWritten { sitemap_path, url_count } => {
            println!("Sitemap with {} URLs written to {}", url_count, sitemap_path.display());
        },
        RunOutcome::Aborted { reason } => {
            println!("Run stopped early: {}", reason);
        },
    }
}

/// List all available configuration profiles
pub fn list_profiles() -> Result<()> {
    let profiles = CrawlerConfig::list_profiles()?;

    println!("Available configuration profiles:");
    for profile in profiles {
        println!("  - {}", profile);
    }

    Ok(())
}

/// Show a profile, creating it from defaults when it does not exist
pub fn manage_profile(profile_name: String) -> Result<()> {
    match CrawlerConfig::load_profile(&profile_name) {
        Ok(config) => {
            println!("Profile: {}", profile_name);
            println!("{:#?}", config);
        },
        Err(_) => {
            warn!("Profile '{}' does not exist. Creating a default profile.", profile_name);
            let config = CrawlerConfig::default();
            config.save_as_profile(&profile_name)?;
            println!("Created default profile: {}", profile_name);
        }
    }

    Ok(())
}

/// Show the current configuration
pub fn show_config() -> Result<()> {
    let config = CrawlerConfig::load_default()?;
    println!("Current configuration:");
    println!("{:#?}", config);

    Ok(())
}
