use tokio::time::Instant;
use url::Url;

use crate::browser::{Control, PageDriver};
use crate::config::{Dismissal, HarvestConfig};
use crate::error::{HarvestError, Result};

/// Navigates to the start page, waits for it to settle and dismisses overlays
pub async fn open<D: PageDriver>(driver: &mut D, config: &HarvestConfig, start: &Url) -> Result<()> {
    ::log::info!("Opening {}", start);
    load(driver, start.as_str(), config).await?;

    let settle = config.initial_settle();
    if !settle.is_zero() {
        ::log::debug!("Waiting {:?} for the page to render", settle);
        tokio::time::sleep(settle).await;
    }

    let dismissed = dismiss_overlays(driver, config).await;
    ::log::debug!("Dismissed {} of {} overlays", dismissed, config.dismissals.len());
    Ok(())
}

/// Navigates and waits for network idle, together bounded by the navigation timeout
pub async fn load<D: PageDriver>(driver: &mut D, url: &str, config: &HarvestConfig) -> Result<()> {
    let timeout = config.nav_timeout();
    let started = Instant::now();
    let failed = |reason: String| HarvestError::NavigationFailed {
        url: url.to_string(),
        reason,
    };

    match tokio::time::timeout(timeout, driver.goto(url)).await {
        Ok(Ok(())) => {}
        Ok(Err(err @ HarvestError::NavigationFailed { .. })) => return Err(err),
        Ok(Err(err)) => return Err(failed(err.to_string())),
        Err(_) => {
            return Err(failed(format!(
                "page load timed out after {:.1}s",
                timeout.as_secs_f64()
            )));
        }
    }

    let remaining = timeout.saturating_sub(started.elapsed());
    match driver.wait_for_network_idle(remaining).await {
        Ok(()) => Ok(()),
        Err(err @ HarvestError::NavigationFailed { .. }) => Err(err),
        Err(err) => Err(failed(err.to_string())),
    }
}

/// Attempts every configured dismissal; failures are logged, never returned.
/// Returns how many overlays were actually clicked away.
pub async fn dismiss_overlays<D: PageDriver>(driver: &mut D, config: &HarvestConfig) -> usize {
    let mut dismissed = 0;

    for dismissal in &config.dismissals {
        let control = match dismissal {
            Dismissal::ButtonText { text } => Control::ButtonText(text.clone()),
            Dismissal::Selector { selector } => Control::Css(selector.clone()),
        };

        match driver.click(&control, config.dismiss_timeout()).await {
            Ok(Some(_)) => {
                ::log::info!("Dismissed {}", dismissal);
                dismissed += 1;
                tokio::time::sleep(config.settle()).await;
            }
            Ok(None) => ::log::info!("No {} found, skipping", dismissal),
            Err(e) => {
                let err = HarvestError::DismissalFailed {
                    action: dismissal.to_string(),
                    reason: e.to_string(),
                };
                ::log::warn!("{}", err);
            }
        }
    }

    dismissed
}
