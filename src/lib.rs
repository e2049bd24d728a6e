// Re-export modules
pub mod artifacts;
pub mod browser;
pub mod config;
pub mod error;
pub mod filter;
pub mod harvester;
pub mod links;
pub mod parsers;
pub mod results;
pub mod utils;

// Re-export commonly used types for convenience
pub use config::{Dismissal, HarvestConfig, NavigationMode};
pub use error::{HarvestError, Result};
pub use results::{HarvestReport, Outcome, StopReason, VisitRecord};

use browser::{PageDriver, WebDriverPage};
use harvester::Harvester;
use links::LinkListing;
use std::path::PathBuf;
use url::Url;

/// Main builder for a harvest run against a WebDriver browser
pub struct Harvest {
    config: HarvestConfig,
}

impl Harvest {
    /// Create a new Harvest builder for the given configuration
    pub fn new(config: HarvestConfig) -> Self {
        Self { config }
    }

    /// Create a builder with default settings for `start_url`
    pub fn from_url(start_url: &str) -> Self {
        Self::new(HarvestConfig::new(start_url))
    }

    /// Load configuration from a file
    pub fn with_config_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        Ok(Self::new(HarvestConfig::from_file(path)?))
    }

    /// Set the directory receiving the artifacts
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    /// Switch to target-list mode with these labels
    pub fn with_target_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.mode = NavigationMode::TargetList;
        self.config.target_labels = labels.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.config.headless = headless;
        self
    }

    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    /// Opens a browser session and runs the harvest
    pub async fn run(mut self) -> Result<HarvestReport> {
        self.config.load_target_labels()?;
        self.config.validate()?;

        let mut page = WebDriverPage::connect(&self.config).await?;
        Harvester::new(&self.config).run(&mut page).await
    }

    /// Opens the start page and lists its navigation links
    pub async fn list_links(self, listing: &LinkListing) -> Result<Vec<Url>> {
        let mut page = WebDriverPage::connect(&self.config).await?;
        let result = links::list_links(&mut page, &self.config, listing).await;
        if let Err(e) = page.close().await {
            ::log::warn!("Failed to close browser session: {}", e);
        }
        result
    }
}
