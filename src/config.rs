use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::error::{HarvestError, Result};
use crate::parsers::navtree;

/// Navigation strategy, selected once per run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NavigationMode {
    /// Follow the pagination "Next" control until it disappears or loops
    #[default]
    LinkedList,
    /// Click each operator-supplied label in order
    TargetList,
}

/// Overlay dismissal action attempted once after the start page loads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Dismissal {
    /// Click the first button whose text contains `text`
    ButtonText { text: String },
    /// Click the element matched by a CSS selector
    Selector { selector: String },
}

impl std::fmt::Display for Dismissal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dismissal::ButtonText { text } => write!(f, "button containing '{}'", text),
            Dismissal::Selector { selector } => write!(f, "element '{}'", selector),
        }
    }
}

/// Configuration for a harvest run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestConfig {
    /// URL of the first page to capture
    pub start_url: String,

    /// Directory receiving the artifacts (created if absent)
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default)]
    pub mode: NavigationMode,

    /// Labels to click in target-list mode
    #[serde(default)]
    pub target_labels: Vec<String>,

    /// Navigation snippet file whose labels are appended to `target_labels`
    #[serde(default)]
    pub target_labels_file: Option<PathBuf>,

    /// Accessible role of target-list controls
    #[serde(default = "default_target_role")]
    pub target_role: String,

    #[serde(default = "default_headless")]
    pub headless: bool,

    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    #[serde(default = "default_window_width")]
    pub window_width: u32,

    #[serde(default = "default_window_height")]
    pub window_height: u32,

    /// Pixels per scroll step while materializing lazy content
    #[serde(default = "default_step_px")]
    pub step_px: u32,

    #[serde(default = "default_step_delay_ms")]
    pub step_delay_ms: u64,

    /// Upper bound on scroll steps per page
    #[serde(default = "default_max_scroll_steps")]
    pub max_scroll_steps: u32,

    /// Bound for network idle and URL change waits
    #[serde(default = "default_nav_timeout_ms")]
    pub nav_timeout_ms: u64,

    /// Pause after the start page goes idle
    #[serde(default = "default_initial_settle_ms")]
    pub initial_settle_ms: u64,

    /// Pause after clicking a dismissal or target control
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    #[serde(default = "default_dismissals")]
    pub dismissals: Vec<Dismissal>,

    #[serde(default = "default_dismiss_timeout_ms")]
    pub dismiss_timeout_ms: u64,

    #[serde(default = "default_target_timeout_ms")]
    pub target_timeout_ms: u64,

    /// CSS selector of the region holding the "Next" control
    #[serde(default = "default_pagination_selector")]
    pub pagination_selector: String,

    #[serde(default = "default_next_text")]
    pub next_text: String,

    /// Internal scroll container whose clipping is removed before capture
    #[serde(default = "default_scroll_container")]
    pub scroll_container: Option<String>,

    /// Sequence number of the first page
    #[serde(default = "default_start_number")]
    pub start_number: u32,

    /// Stop after this many pages
    #[serde(default)]
    pub max_pages: Option<u32>,

    /// Suffix stripped from page titles before naming artifacts
    #[serde(default)]
    pub title_suffix: Option<String>,

    #[serde(default = "default_file_poll_attempts")]
    pub file_poll_attempts: u32,

    #[serde(default = "default_file_poll_interval_ms")]
    pub file_poll_interval_ms: u64,

    /// Collapse blank-line runs and trailing whitespace in text dumps
    #[serde(default = "default_normalize_text")]
    pub normalize_text: bool,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("harvest")
}

fn default_target_role() -> String {
    "button".to_string()
}

fn default_headless() -> bool {
    true
}

/// Default value for webdriver_url
fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_window_width() -> u32 {
    1600
}

fn default_window_height() -> u32 {
    1200
}

fn default_step_px() -> u32 {
    800
}

fn default_step_delay_ms() -> u64 {
    200
}

fn default_max_scroll_steps() -> u32 {
    200
}

fn default_nav_timeout_ms() -> u64 {
    10_000
}

fn default_initial_settle_ms() -> u64 {
    3_000
}

fn default_settle_ms() -> u64 {
    1_000
}

fn default_dismissals() -> Vec<Dismissal> {
    vec![Dismissal::ButtonText {
        text: "I agree".to_string(),
    }]
}

fn default_dismiss_timeout_ms() -> u64 {
    3_000
}

fn default_target_timeout_ms() -> u64 {
    5_000
}

fn default_pagination_selector() -> String {
    "dev-portal-documentation-pagination".to_string()
}

fn default_next_text() -> String {
    "Next".to_string()
}

fn default_scroll_container() -> Option<String> {
    Some(".tui-scrollbar__container".to_string())
}

fn default_start_number() -> u32 {
    1
}

fn default_file_poll_attempts() -> u32 {
    50
}

fn default_file_poll_interval_ms() -> u64 {
    100
}

fn default_normalize_text() -> bool {
    true
}

impl HarvestConfig {
    /// Create a new configuration with default values
    pub fn new(start_url: &str) -> Self {
        Self {
            start_url: start_url.to_string(),
            output_dir: default_output_dir(),
            mode: NavigationMode::default(),
            target_labels: Vec::new(),
            target_labels_file: None,
            target_role: default_target_role(),
            headless: default_headless(),
            webdriver_url: default_webdriver_url(),
            window_width: default_window_width(),
            window_height: default_window_height(),
            step_px: default_step_px(),
            step_delay_ms: default_step_delay_ms(),
            max_scroll_steps: default_max_scroll_steps(),
            nav_timeout_ms: default_nav_timeout_ms(),
            initial_settle_ms: default_initial_settle_ms(),
            settle_ms: default_settle_ms(),
            dismissals: default_dismissals(),
            dismiss_timeout_ms: default_dismiss_timeout_ms(),
            target_timeout_ms: default_target_timeout_ms(),
            pagination_selector: default_pagination_selector(),
            next_text: default_next_text(),
            scroll_container: default_scroll_container(),
            start_number: default_start_number(),
            max_pages: None,
            title_suffix: None,
            file_poll_attempts: default_file_poll_attempts(),
            file_poll_interval_ms: default_file_poll_interval_ms(),
            normalize_text: default_normalize_text(),
        }
    }

    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut file = File::open(path).map_err(|e| HarvestError::io(path, e))?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| HarvestError::io(path, e))?;

        Self::from_json(&contents)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| HarvestError::Config(e.to_string()))
    }

    /// Apply the `WEBDRIVER_URL` environment override, if set and non-empty
    pub fn apply_env(&mut self) {
        if let Ok(webdriver_url) = std::env::var("WEBDRIVER_URL") {
            if !webdriver_url.is_empty() {
                self.webdriver_url = webdriver_url;
            }
        }
    }

    /// Appends the labels found in `target_labels_file` to `target_labels`
    pub fn load_target_labels(&mut self) -> Result<()> {
        let Some(path) = self.target_labels_file.clone() else {
            return Ok(());
        };
        let snippet = std::fs::read_to_string(&path).map_err(|e| HarvestError::io(&path, e))?;
        let labels = navtree::parse_labels(&snippet)?;
        ::log::info!("Loaded {} labels from {}", labels.len(), path.display());
        self.target_labels.extend(labels);
        Ok(())
    }

    /// Checks the configuration before a session is opened
    pub fn validate(&self) -> Result<Url> {
        let url = Url::parse(&self.start_url).map_err(|source| HarvestError::InvalidUrl {
            url: self.start_url.clone(),
            source,
        })?;

        if self.mode == NavigationMode::TargetList && self.target_labels.is_empty() {
            return Err(HarvestError::Config(
                "target-list mode needs at least one target label".to_string(),
            ));
        }
        if self.step_px == 0 {
            return Err(HarvestError::Config("step_px must be positive".to_string()));
        }
        if self.max_scroll_steps == 0 {
            return Err(HarvestError::Config(
                "max_scroll_steps must be positive".to_string(),
            ));
        }
        if self.nav_timeout_ms == 0 {
            return Err(HarvestError::Config(
                "nav_timeout_ms must be positive".to_string(),
            ));
        }
        if self.file_poll_attempts == 0 {
            return Err(HarvestError::Config(
                "file_poll_attempts must be positive".to_string(),
            ));
        }
        if self.max_pages == Some(0) {
            return Err(HarvestError::Config("max_pages must be positive".to_string()));
        }

        Ok(url)
    }

    pub fn nav_timeout(&self) -> Duration {
        Duration::from_millis(self.nav_timeout_ms)
    }

    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn initial_settle(&self) -> Duration {
        Duration::from_millis(self.initial_settle_ms)
    }

    pub fn dismiss_timeout(&self) -> Duration {
        Duration::from_millis(self.dismiss_timeout_ms)
    }

    pub fn target_timeout(&self) -> Duration {
        Duration::from_millis(self.target_timeout_ms)
    }

    pub fn file_poll_interval(&self) -> Duration {
        Duration::from_millis(self.file_poll_interval_ms)
    }
}
