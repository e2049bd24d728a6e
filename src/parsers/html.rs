use scraper::{Html, Selector};
use url::Url;

use crate::error::{HarvestError, Result};
use crate::filter::UrlFilter;

/// Extracts the `href` of every element matching `selector`, resolved
/// against `base`, fragment-stripped and de-duplicated in document order
pub fn extract_links(html: &str, selector: &str, base: &Url) -> Result<Vec<Url>> {
    let selector = Selector::parse(selector)
        .map_err(|e| HarvestError::Config(format!("invalid selector '{}': {}", selector, e)))?;
    let doc = Html::parse_document(html);

    let mut links: Vec<Url> = Vec::new();
    for href in doc.select(&selector).filter_map(|e| e.value().attr("href")) {
        let href = href.trim();
        if href.is_empty() || href.starts_with("javascript:") {
            continue;
        }
        match base.join(href) {
            Ok(resolved) => {
                let normalized = UrlFilter::normalize_url(&resolved);
                if !links.contains(&normalized) {
                    links.push(normalized);
                }
            }
            Err(e) => ::log::debug!("Skipping unparsable href '{}': {}", href, e),
        }
    }

    ::log::debug!("HTML parser found {} links", links.len());
    Ok(links)
}
