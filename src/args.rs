use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use page_harvest::links::LinkListing;
use page_harvest::{Dismissal, HarvestConfig, HarvestError, NavigationMode, Result};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "page-harvest")]
#[command(about = "Captures documentation pages (screenshot, text, PDF) through a WebDriver browser")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Capture pages by following "Next" or clicking named controls
    Harvest(HarvestArgs),

    /// List the navigation links of a page
    Links(LinksArgs),

    /// Print the labels of a sidebar navigation snippet
    NavLabels {
        /// File holding a JavaScript object/array literal
        file: PathBuf,

        /// Print the parsed tree as JSON instead of one label per line
        #[arg(long)]
        json: bool,
    },
}

/// Options shared by every command that opens a browser
#[derive(ClapArgs, Debug)]
pub struct BrowserArgs {
    /// JSON configuration file; flags override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// WebDriver endpoint (defaults to WEBDRIVER_URL or http://localhost:4444)
    #[arg(long)]
    pub webdriver_url: Option<String>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Bound for page loads, network idle and URL changes
    #[arg(long)]
    pub nav_timeout_ms: Option<u64>,
}

#[derive(ClapArgs, Debug)]
pub struct HarvestArgs {
    /// Start URL (required unless the config file provides one)
    pub start_url: Option<String>,

    #[command(flatten)]
    pub browser: BrowserArgs,

    /// Directory receiving the artifacts
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Navigation strategy
    #[arg(short, long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Label to click in target-list mode (repeatable)
    #[arg(short = 'l', long = "label")]
    pub labels: Vec<String>,

    /// Navigation snippet whose labels are clicked in target-list mode
    #[arg(long)]
    pub labels_file: Option<PathBuf>,

    /// Pixels per scroll step
    #[arg(long)]
    pub step_px: Option<u32>,

    /// Pause after each scroll step
    #[arg(long)]
    pub step_delay_ms: Option<u64>,

    /// Sequence number of the first page
    #[arg(long)]
    pub start_number: Option<u32>,

    /// Stop after this many pages
    #[arg(long)]
    pub max_pages: Option<u32>,

    /// Suffix removed from page titles, e.g. " - Developer Portal"
    #[arg(long)]
    pub title_suffix: Option<String>,

    /// Text of the cookie consent button
    #[arg(long)]
    pub consent_text: Option<String>,

    /// CSS selector of a popup close control
    #[arg(long)]
    pub popup_selector: Option<String>,

    /// Do not try to dismiss any overlay
    #[arg(long, conflicts_with_all = ["consent_text", "popup_selector"])]
    pub no_dismiss: bool,
}

#[derive(ClapArgs, Debug)]
pub struct LinksArgs {
    /// Page to read links from (required unless the config file provides one)
    pub url: Option<String>,

    #[command(flatten)]
    pub browser: BrowserArgs,

    /// CSS selector of the link elements
    #[arg(short, long, default_value = "nav a")]
    pub selector: String,

    /// Keep only links below the page's directory on the same host
    #[arg(long)]
    pub scoped: bool,

    /// Regex of links to drop (repeatable)
    #[arg(long)]
    pub exclude: Vec<String>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    LinkedList,
    TargetList,
}

impl From<ModeArg> for NavigationMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::LinkedList => NavigationMode::LinkedList,
            ModeArg::TargetList => NavigationMode::TargetList,
        }
    }
}

impl BrowserArgs {
    /// Config file (or defaults for `url`), then WEBDRIVER_URL, then flags
    fn base_config(&self, url: Option<&str>) -> Result<HarvestConfig> {
        let mut config = match (&self.config, url) {
            (Some(path), _) => HarvestConfig::from_file(path)?,
            (None, Some(url)) => HarvestConfig::new(url),
            (None, None) => {
                return Err(HarvestError::Config(
                    "a start URL or a --config file is required".to_string(),
                ));
            }
        };
        if let Some(url) = url {
            config.start_url = url.to_string();
        }
        config.apply_env();

        if let Some(webdriver_url) = &self.webdriver_url {
            config.webdriver_url = webdriver_url.clone();
        }
        if self.headed {
            config.headless = false;
        }
        if let Some(timeout) = self.nav_timeout_ms {
            config.nav_timeout_ms = timeout;
        }
        Ok(config)
    }
}

impl HarvestArgs {
    pub fn into_config(self) -> Result<HarvestConfig> {
        let mut config = self.browser.base_config(self.start_url.as_deref())?;

        if let Some(dir) = self.output_dir {
            config.output_dir = dir;
        }
        if let Some(mode) = self.mode {
            config.mode = mode.into();
        }
        if !self.labels.is_empty() {
            config.target_labels = self.labels;
        }
        if self.labels_file.is_some() {
            config.target_labels_file = self.labels_file;
        }
        if let Some(step_px) = self.step_px {
            config.step_px = step_px;
        }
        if let Some(delay) = self.step_delay_ms {
            config.step_delay_ms = delay;
        }
        if let Some(start_number) = self.start_number {
            config.start_number = start_number;
        }
        if self.max_pages.is_some() {
            config.max_pages = self.max_pages;
        }
        if self.title_suffix.is_some() {
            config.title_suffix = self.title_suffix;
        }

        if self.no_dismiss {
            config.dismissals.clear();
        } else {
            if let Some(text) = self.consent_text {
                config
                    .dismissals
                    .retain(|d| !matches!(d, Dismissal::ButtonText { .. }));
                config.dismissals.insert(0, Dismissal::ButtonText { text });
            }
            if let Some(selector) = self.popup_selector {
                config.dismissals.push(Dismissal::Selector { selector });
            }
        }

        Ok(config)
    }
}

impl LinksArgs {
    pub fn into_parts(self) -> Result<(HarvestConfig, LinkListing)> {
        let config = self.browser.base_config(self.url.as_deref())?;
        let listing = LinkListing {
            selector: self.selector,
            scoped: self.scoped,
            exclude_patterns: self.exclude,
        };
        Ok((config, listing))
    }
}
