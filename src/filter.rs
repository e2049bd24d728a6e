use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

/// Configuration for scoping extracted links
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UrlFilterConfig {
    /// Only keep links on this host (if None, all hosts are kept)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_domain: Option<String>,

    /// Only keep links whose path starts with this prefix
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_path_prefix: Option<String>,

    /// Regex patterns for URLs to exclude
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
}

/// Decides which discovered links belong to the documentation being harvested
#[derive(Debug, Default)]
pub struct UrlFilter {
    config: UrlFilterConfig,
    exclude_regexes: Vec<Regex>,
}

impl UrlFilter {
    /// Create a new URL filter from configuration
    pub fn new(config: UrlFilterConfig) -> Result<Self, regex::Error> {
        let mut exclude_regexes = Vec::with_capacity(config.exclude_patterns.len());
        for pattern in &config.exclude_patterns {
            exclude_regexes.push(Regex::new(pattern)?);
        }

        Ok(Self {
            config,
            exclude_regexes,
        })
    }

    /// Filter scoped to the host of `root` and the directory part of its path
    pub fn scoped_to(root: &Url, exclude_patterns: Vec<String>) -> Result<Self, regex::Error> {
        let path = root.path();
        let prefix = match path.rfind('/') {
            Some(idx) => &path[..=idx],
            None => "/",
        };
        Self::new(UrlFilterConfig {
            required_domain: root.host_str().map(str::to_string),
            required_path_prefix: Some(prefix.to_string()),
            exclude_patterns,
        })
    }

    /// Whether a link passes the domain, path and exclusion rules
    pub fn accepts(&self, url: &Url) -> bool {
        if let Some(required_domain) = &self.config.required_domain {
            if url.host_str() != Some(required_domain.as_str()) {
                return false;
            }
        }

        if let Some(prefix) = &self.config.required_path_prefix {
            if !url.path().starts_with(prefix.as_str()) {
                return false;
            }
        }

        !self.exclude_regexes.iter().any(|r| r.is_match(url.as_str()))
    }

    /// Create a normalized version of the URL (fragment removed)
    pub fn normalize_url(url: &Url) -> Url {
        let mut normalized = url.clone();
        normalized.set_fragment(None);
        normalized
    }

    /// Normalizes a URL string, falling back to trimming at `#` when it does not parse
    pub fn normalize_str(url: &str) -> String {
        match Url::parse(url) {
            Ok(parsed) => Self::normalize_url(&parsed).to_string(),
            Err(_) => url.split('#').next().unwrap_or(url).to_string(),
        }
    }
}
