pub mod commands;
pub mod config;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use config::{CrawlerConfig, FetcherKind};

#[derive(Parser)]
#[command(author, version, about = "Generate a sitemap for a site and audit its pages for SEO issues", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Also write logs to a file (default location when no path is given)
    #[arg(long, global = true, value_name = "PATH", num_args = 0..=1)]
    pub log_file: Option<Option<PathBuf>>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a sitemap, then audit every page it lists
    Run {
        /// Start URL of the site
        #[arg(required = true)]
        url: String,

        #[command(flatten)]
        args: CrawlArgs,
    },

    /// Only crawl the site and write a new sitemap
    Sitemap {
        /// Start URL of the site
        #[arg(required = true)]
        url: String,

        #[command(flatten)]
        args: CrawlArgs,
    },

    /// Manage configuration profiles
    Config {
        /// Profile name to manage
        #[arg(required = false)]
        profile: Option<String>,

        /// List all available profiles
        #[arg(short, long)]
        list: bool,
    },
}

/// Configuration source and per-run overrides
#[derive(Args, Debug, Default)]
pub struct CrawlArgs {
    /// Site profile to use
    #[arg(short, long)]
    pub profile: Option<String>,

    /// Configuration file, takes precedence over --profile
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Maximum pages to crawl while generating the sitemap
    #[arg(long)]
    pub max_sitemap_pages: Option<usize>,

    /// Maximum pages to audit
    #[arg(long)]
    pub max_analyze_pages: Option<usize>,

    /// Output directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// How pages are fetched
    #[arg(long, value_enum)]
    pub fetcher: Option<FetcherKind>,

    /// Do not write to the document store
    #[arg(long)]
    pub no_store: bool,

    /// Do not download page images
    #[arg(long)]
    pub no_images: bool,
}

impl CrawlArgs {
    /// Apply command line overrides on top of a loaded configuration
    pub fn apply(&self, config: &mut CrawlerConfig) {
        if let Some(pages) = self.max_sitemap_pages {
            config.crawl.max_sitemap_pages = pages;
        }
        if let Some(pages) = self.max_analyze_pages {
            config.crawl.max_analyze_pages = pages;
        }
        if let Some(dir) = &self.output {
            config.output.dir = dir.clone();
        }
        if let Some(fetcher) = self.fetcher {
            config.browser.fetcher = fetcher;
        }
        if self.no_store {
            config.storage.enabled = false;
        }
        if self.no_images {
            config.images.download = false;
        }
    }
}

/// Parse command line arguments
pub fn parse_args() -> Cli {
    Cli::parse()
}

/// Process the command
pub async fn process_command(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Run { url, args } => {
            info!("Starting full run on {}", url);
            commands::run(url, args).await
        },
        Commands::Sitemap { url, args } => {
            info!("Generating sitemap for {}", url);
            commands::sitemap(url, args).await
        },
        Commands::Config { profile, list } => {
            if list {
                info!("Listing all configuration profiles");
                commands::list_profiles()
            } else if let Some(profile_name) = profile {
                info!("Managing configuration profile: {}", profile_name);
                commands::manage_profile(profile_name)
            } else {
                info!("Showing current configuration");
                commands::show_config()
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert()
    }

    #[test]
    fn run_overrides_apply() {
        let cli = Cli::parse_from([
            "seo-crawler",
            "run",
            "https://example.com/",
            "--max-sitemap-pages",
            "20",
            "--output",
            "/tmp/out",
            "--fetcher",
            "http",
            "--no-store",
        ]);

        let Commands::Run { url, args } = cli.command else {
            panic!("expected the run command");
        };
        assert_eq!(url, "https://example.com/");

        let mut config = CrawlerConfig::default();
        args.apply(&mut config);
        assert_eq!(config.crawl.max_sitemap_pages, 20);
        assert_eq!(config.crawl.max_analyze_pages, 1000);
        assert_eq!(config.output.dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.browser.fetcher, FetcherKind::Http);
        assert!(!config.storage.enabled);
        assert!(config.images.download);
    }

    #[test]
    fn log_file_path_is_optional() {
        let cli = Cli::parse_from(["seo-crawler", "config", "--list", "--log-file"]);
        assert_eq!(cli.log_file, Some(None));

        let cli = Cli::parse_from(["seo-crawler", "--verbose", "config", "--log-file", "crawl.log"]);
        assert!(cli.verbose);
        assert_eq!(cli.log_file, Some(Some(PathBuf::from("crawl.log"))));
    }
}
