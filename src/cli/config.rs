use anyhow::{Result, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::fs;
use tracing::{info, debug, error};

/// Main configuration structure
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct CrawlerConfig {
    pub crawl: CrawlSettings,
    pub output: OutputSettings,
    pub browser: BrowserSettings,
    pub storage: StorageSettings,
    pub images: ImageSettings,
}

/// Crawl behaviour shared by both phases
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct CrawlSettings {
    pub start_url: String,
    pub max_sitemap_pages: usize,
    pub max_analyze_pages: usize,
    pub user_agent: String,
    /// A URL is crawled when any of these agents is allowed by robots.txt
    pub robots_agents: Vec<String>,
    pub politeness_delay: (u64, u64),  // Min and max delay in milliseconds
    pub page_timeout_secs: u64,
    pub robots_timeout_secs: u64,
    pub sitemap_timeout_secs: u64,
    pub check_existing_sitemap: bool,
}

/// Where generated artifacts are written
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct OutputSettings {
    pub dir: PathBuf,
    pub sitemap_filename: String,
    pub report_filename: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FetcherKind {
    /// Render pages in a WebDriver-controlled Chrome
    Browser,
    /// Plain HTTP GET, no JavaScript
    Http,
}

/// Page rendering settings
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct BrowserSettings {
    pub fetcher: FetcherKind,
    pub webdriver_url: String,
    pub headless: bool,
}

/// Document store settings
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct StorageSettings {
    pub enabled: bool,
    pub connection_string: String,
    pub database_name: String,
    pub pages_collection: String,
    pub summary_collection: String,
    pub clear_on_start: bool,
}

/// Image archiving settings
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ImageSettings {
    pub download: bool,
    pub max_per_page: usize,
    pub timeout_secs: u64,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            start_url: String::new(),
            max_sitemap_pages: 500,
            max_analyze_pages: 1000,
            user_agent: "MyFriendlyBot/1.0 (+https://yourdomain.com/bot-info)".to_string(),
            robots_agents: vec!["Googlebot".to_string(), "MyFriendlyBot".to_string()],
            politeness_delay: (1000, 3000),
            page_timeout_secs: 30,
            robots_timeout_secs: 8,
            sitemap_timeout_secs: 15,
            check_existing_sitemap: true,
        }
    }
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
            sitemap_filename: "sitemap_new_generated.xml".to_string(),
            report_filename: "seo_report.txt".to_string(),
        }
    }
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            fetcher: FetcherKind::Browser,
            webdriver_url: "http://localhost:4444".to_string(),
            headless: true,
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            connection_string: "mongodb://localhost:27017".to_string(),
            database_name: "seo_crawler".to_string(),
            pages_collection: "articles".to_string(),
            summary_collection: "seo_summary_reports".to_string(),
            clear_on_start: true,
        }
    }
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            download: true,
            max_per_page: 3,
            timeout_secs: 10,
        }
    }
}

impl CrawlerConfig {
    /// Get the path to the config directory
    fn config_dir() -> PathBuf {
        let mut path = if let Some(proj_dirs) = directories::ProjectDirs::from("com", "seo-crawler", "seo-crawler") {
            proj_dirs.config_dir().to_path_buf()
        } else {
            PathBuf::from("./config")
        };

        // Create the sites directory if it doesn't exist
        path.push("sites");
        if !path.exists() {
            if let Err(e) = fs::create_dir_all(&path) {
                error!("Failed to create config directory: {}", e);
            }
        }

        path.pop();
        path
    }

    /// Load the default configuration
    pub fn load_default() -> Result<Self> {
        let config_path = Self::config_dir().join("default.yaml");

        if config_path.exists() {
            Self::load_from_file(&config_path)
        } else {
            info!("Default configuration not found. Creating...");
            let config = Self::default();
            config.save_as_default()?;
            Ok(config)
        }
    }

    /// Load a configuration profile
    pub fn load_profile(profile: &str) -> Result<Self> {
        let profile_path = Self::config_dir().join("sites").join(format!("{}.yaml", profile));

        if profile_path.exists() {
            Self::load_from_file(&profile_path)
        } else {
            anyhow::bail!("Profile '{}' not found", profile)
        }
    }

    /// Load configuration from a file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from: {}", path.display());
        let contents = fs::read_to_string(path)
            .context(format!("Failed to read configuration file: {}", path.display()))?;

        Self::from_yaml(&contents)
            .context(format!("Failed to parse configuration file: {}", path.display()))
    }

    /// Parse a YAML document; missing keys fall back to defaults
    pub fn from_yaml(contents: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(contents)?;
        Ok(config)
    }

    /// Save the configuration as the default
    pub fn save_as_default(&self) -> Result<()> {
        let config_path = Self::config_dir().join("default.yaml");
        self.save_to_file(&config_path)
    }

    /// Save the configuration as a profile
    pub fn save_as_profile(&self, profile: &str) -> Result<()> {
        let sites_dir = Self::config_dir().join("sites");

        if !sites_dir.exists() {
            fs::create_dir_all(&sites_dir)
                .context(format!("Failed to create sites directory: {}", sites_dir.display()))?;
        }

        let profile_path = sites_dir.join(format!("{}.yaml", profile));
        self.save_to_file(&profile_path)
    }

    /// Save the configuration to a file
    fn save_to_file(&self, path: &Path) -> Result<()> {
        debug!("Saving configuration to: {}", path.display());

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)
                    .context(format!("Failed to create directory: {}", parent.display()))?;
            }
        }

        let contents = serde_yaml::to_string(self)
            .context("Failed to serialize configuration")?;

        fs::write(path, contents)
            .context(format!("Failed to write configuration file: {}", path.display()))?;

        Ok(())
    }

    /// List all available profiles
    pub fn list_profiles() -> Result<Vec<String>> {
        let sites_dir = Self::config_dir().join("sites");

        if !sites_dir.exists() {
            return Ok(vec![]);
        }

        let mut profiles = Vec::new();

        for entry in fs::read_dir(sites_dir)? {
            let path = entry?.path();

            if path.is_file() && path.extension().map_or(false, |ext| ext == "yaml") {
                if let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) {
                    profiles.push(name.to_string());
                }
            }
        }

        profiles.sort();
        Ok(profiles)
    }

    /// Check the values the crawl cannot run without
    pub fn validate(&self) -> Result<()> {
        let start = url::Url::parse(&self.crawl.start_url)
            .context(format!("Invalid start URL: {}", self.crawl.start_url))?;
        if !matches!(start.scheme(), "http" | "https") {
            anyhow::bail!("Start URL must be http or https: {}", self.crawl.start_url);
        }
        let (min, max) = self.crawl.politeness_delay;
        if min > max {
            anyhow::bail!("politeness_delay minimum {} exceeds maximum {}", min, max);
        }
        if self.crawl.robots_agents.is_empty() {
            anyhow::bail!("At least one robots agent name is required");
        }
        Ok(())
    }
}
