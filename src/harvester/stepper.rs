use std::collections::HashSet;
use std::time::Duration;
use tokio::time::Instant;

use crate::browser::{Control, PageDriver};
use crate::config::HarvestConfig;
use crate::error::{HarvestError, Result};
use crate::filter::UrlFilter;
use crate::results::StopReason;

/// Interval between URL checks after clicking "next"
const URL_POLL: Duration = Duration::from_millis(100);

/// What the harvester should do after a navigation step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepDecision {
    /// A new page is loaded at this URL
    Continue(String),
    Stop(StopReason),
}

/// Follows the pagination "next" control and detects loops
#[derive(Debug)]
pub struct LinkedListStepper {
    next: Control,
    nav_timeout: Duration,
    settle: Duration,
    visited: HashSet<String>,
}

impl LinkedListStepper {
    pub fn new(config: &HarvestConfig) -> Self {
        Self {
            next: Control::TextWithin {
                scope: config.pagination_selector.clone(),
                text: config.next_text.clone(),
            },
            nav_timeout: config.nav_timeout(),
            settle: config.settle(),
            visited: HashSet::new(),
        }
    }

    /// Records arrival at `url`; stops with `CycleDetected` if it was seen before
    pub fn enter(&mut self, url: &str) -> StepDecision {
        let normalized = UrlFilter::normalize_str(url);
        if self.visited.insert(normalized.clone()) {
            StepDecision::Continue(normalized)
        } else {
            ::log::warn!("Returned to {}, stopping", normalized);
            StepDecision::Stop(StopReason::CycleDetected)
        }
    }

    /// Clicks "next", waits for the URL to change, then for the new page to
    /// load and settle. The URL and idle waits share the navigation timeout.
    pub async fn advance<D: PageDriver>(&mut self, driver: &mut D) -> Result<StepDecision> {
        let prev_url = driver.current_url().await?;

        let Some(text) = driver.click(&self.next, Duration::ZERO).await? else {
            ::log::info!("Next link not found. Finished scraping.");
            return Ok(StepDecision::Stop(StopReason::EndOfDocument));
        };
        ::log::info!("Clicking Next link: {}", text);

        let started = Instant::now();
        let url = wait_for_url_change(driver, &prev_url, self.nav_timeout)
            .await
            .map_err(|err| match err {
                HarvestError::StepperTimeout { url, waited, .. } => HarvestError::StepperTimeout {
                    url,
                    control: text.clone(),
                    waited,
                },
                other => other,
            })?;

        // Client-side routing swaps the URL before the new content renders
        let remaining = self.nav_timeout.saturating_sub(started.elapsed());
        match driver.wait_for_network_idle(remaining).await {
            Ok(()) => {}
            Err(HarvestError::NavigationFailed { reason, .. }) => {
                ::log::warn!("{} not idle, capturing anyway: {}", url, reason);
            }
            Err(err) => return Err(err),
        }
        if !self.settle.is_zero() {
            tokio::time::sleep(self.settle).await;
        }

        Ok(StepDecision::Continue(url))
    }

    pub fn visited(&self) -> &HashSet<String> {
        &self.visited
    }
}

/// Polls the page URL until it differs from `prev_url`
pub async fn wait_for_url_change<D: PageDriver>(
    driver: &mut D,
    prev_url: &str,
    timeout: Duration,
) -> Result<String> {
    let started = Instant::now();
    loop {
        let url = driver.current_url().await?;
        if url != prev_url {
            return Ok(url);
        }
        if started.elapsed() >= timeout {
            ::log::warn!("Timeout waiting for URL change. Stopping.");
            return Err(HarvestError::StepperTimeout {
                url,
                control: String::new(),
                waited: started.elapsed(),
            });
        }
        tokio::time::sleep(URL_POLL).await;
    }
}

/// Clicks operator-supplied labels one at a time
#[derive(Debug)]
pub struct TargetListStepper {
    role: String,
    wait: Duration,
    settle: Duration,
    visited: HashSet<String>,
}

impl TargetListStepper {
    pub fn new(config: &HarvestConfig) -> Self {
        Self {
            role: config.target_role.clone(),
            wait: config.target_timeout(),
            settle: config.settle(),
            visited: HashSet::new(),
        }
    }

    /// Clicks the control named `label` and returns the resulting URL.
    /// `None` means the label was skipped: missing, unclickable, or leading
    /// to a page that was already captured.
    pub async fn select<D: PageDriver>(
        &mut self,
        driver: &mut D,
        label: &str,
    ) -> Result<Option<String>> {
        let control = Control::Role {
            role: self.role.clone(),
            name: label.to_string(),
        };

        match driver.click(&control, self.wait).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                ::log::warn!("Skip {}: no {} within {:?}", label, control, self.wait);
                return Ok(None);
            }
            Err(e) => {
                ::log::warn!("Skip {}: {}", label, e);
                return Ok(None);
            }
        }
        if !self.settle.is_zero() {
            tokio::time::sleep(self.settle).await;
        }

        let url = driver.current_url().await?;
        if !self.visited.insert(UrlFilter::normalize_str(&url)) {
            ::log::info!("Skip {}: {} already captured", label, url);
            return Ok(None);
        }
        Ok(Some(url))
    }

    pub fn visited(&self) -> &HashSet<String> {
        &self.visited
    }
}
