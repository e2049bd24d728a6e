use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::parsers::navtree::NavTreeError;

/// Errors that can end (or, for dismissals, merely interrupt) a harvest run
#[derive(Error, Debug)]
pub enum HarvestError {
    /// The start page (or a page opened for link listing) could not be loaded
    #[error("navigation to {url} failed: {reason}")]
    NavigationFailed { url: String, reason: String },

    /// A capture step (screenshot, text dump, PDF) failed in the browser
    #[error("capturing {artifact} failed: {reason}")]
    CaptureFailed {
        artifact: &'static str,
        reason: String,
    },

    /// A written artifact never showed up on disk
    #[error("{} did not materialize after {attempts} polls", path.display())]
    CaptureTimeout { path: PathBuf, attempts: u32 },

    /// An optional overlay could not be dismissed; only ever logged
    #[error("dismissal '{action}' failed: {reason}")]
    DismissalFailed { action: String, reason: String },

    /// The page URL did not change after clicking the next control
    #[error("URL stayed at {url} for {:.1}s after clicking '{control}'", waited.as_secs_f64())]
    StepperTimeout {
        url: String,
        control: String,
        waited: Duration,
    },

    #[error("failed to open a WebDriver session at {url}: {source}")]
    Session {
        url: String,
        #[source]
        source: fantoccini::error::NewSessionError,
    },

    #[error("WebDriver command failed: {0}")]
    WebDriver(#[from] fantoccini::error::CmdError),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("navigation snippet: {0}")]
    NavTree(#[from] NavTreeError),

    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

impl HarvestError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        HarvestError::Io {
            path: path.into(),
            source,
        }
    }

    /// Short machine-friendly name of the error kind, used in the run manifest
    pub fn kind(&self) -> &'static str {
        match self {
            HarvestError::NavigationFailed { .. } => "navigation_failed",
            HarvestError::CaptureFailed { .. } => "capture_failed",
            HarvestError::CaptureTimeout { .. } => "capture_timeout",
            HarvestError::DismissalFailed { .. } => "dismissal_failed",
            HarvestError::StepperTimeout { .. } => "stepper_timeout",
            HarvestError::Session { .. } => "session",
            HarvestError::WebDriver(_) => "webdriver",
            HarvestError::Io { .. } => "io",
            HarvestError::Config(_) => "config",
            HarvestError::NavTree(_) => "nav_tree",
            HarvestError::InvalidUrl { .. } => "invalid_url",
        }
    }
}

pub type Result<T> = std::result::Result<T, HarvestError>;
