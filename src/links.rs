use url::Url;

use crate::browser::PageDriver;
use crate::config::HarvestConfig;
use crate::error::{HarvestError, Result};
use crate::filter::{UrlFilter, UrlFilterConfig};
use crate::harvester::bootstrap;
use crate::parsers::html;

/// Options for listing the navigation links of a page
#[derive(Debug, Clone)]
pub struct LinkListing {
    /// CSS selector of the link elements
    pub selector: String,
    /// Keep only links on the page's host below its directory
    pub scoped: bool,
    /// Regex patterns of links to drop
    pub exclude_patterns: Vec<String>,
}

impl Default for LinkListing {
    fn default() -> Self {
        Self {
            selector: "nav a".to_string(),
            scoped: false,
            exclude_patterns: Vec::new(),
        }
    }
}

/// Opens `config.start_url` and returns the links matched by `listing.selector`
pub async fn list_links<D: PageDriver>(
    driver: &mut D,
    config: &HarvestConfig,
    listing: &LinkListing,
) -> Result<Vec<Url>> {
    let start = Url::parse(&config.start_url).map_err(|source| HarvestError::InvalidUrl {
        url: config.start_url.clone(),
        source,
    })?;

    bootstrap::load(driver, start.as_str(), config).await?;
    let settle = config.initial_settle();
    if !settle.is_zero() {
        tokio::time::sleep(settle).await;
    }

    // Redirects may have moved us; resolve against where we landed
    let landed = driver.current_url().await?;
    let base = Url::parse(&landed).unwrap_or(start);
    let source = driver.page_source().await?;
    let links = html::extract_links(&source, &listing.selector, &base)?;

    let filter = if listing.scoped {
        UrlFilter::scoped_to(&base, listing.exclude_patterns.clone())
    } else {
        UrlFilter::new(UrlFilterConfig {
            exclude_patterns: listing.exclude_patterns.clone(),
            ..Default::default()
        })
    }
    .map_err(|e| HarvestError::Config(format!("invalid exclude pattern: {}", e)))?;

    let total = links.len();
    let kept: Vec<Url> = links.into_iter().filter(|l| filter.accepts(l)).collect();
    ::log::info!("Found {} links in {} ({} kept)", total, base, kept.len());
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harvester::mock::MockSite;

    const OVERVIEW: &str = "https://portal.example.dev/documentation/overview";

    fn site() -> MockSite {
        let mut site = MockSite::new().page(OVERVIEW, "Overview", None);
        site.pages.get_mut(OVERVIEW).unwrap().source = r#"
            <nav>
              <a href="/documentation/apis/authentication">Authentication</a>
              <a href="apis/swap/classic-swap/quick-start#install">Quick start</a>
              <a href="https://github.com/example">GitHub</a>
              <a href="/blog/release">Blog</a>
            </nav>
            <footer><a href="/terms">Terms</a></footer>
        "#
        .to_string();
        site
    }

    fn config() -> HarvestConfig {
        let mut config = HarvestConfig::new(OVERVIEW);
        config.initial_settle_ms = 0;
        config.nav_timeout_ms = 50;
        config
    }

    #[tokio::test]
    async fn test_list_all_nav_links() {
        let mut site = site();
        let links = list_links(&mut site, &config(), &LinkListing::default())
            .await
            .unwrap();
        let links: Vec<&str> = links.iter().map(Url::as_str).collect();
        assert_eq!(
            links,
            vec![
                "https://portal.example.dev/documentation/apis/authentication",
                "https://portal.example.dev/documentation/apis/swap/classic-swap/quick-start",
                "https://github.com/example",
                "https://portal.example.dev/blog/release",
            ]
        );
    }

    #[tokio::test]
    async fn test_scoped_listing() {
        let mut site = site();
        let listing = LinkListing {
            scoped: true,
            exclude_patterns: vec!["quick-start".to_string()],
            ..LinkListing::default()
        };
        let links = list_links(&mut site, &config(), &listing).await.unwrap();
        let links: Vec<&str> = links.iter().map(Url::as_str).collect();
        assert_eq!(
            links,
            vec!["https://portal.example.dev/documentation/apis/authentication"]
        );
    }
}
