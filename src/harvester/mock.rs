//! In-memory page driver for harvester tests.

use std::collections::HashMap;
use std::time::Duration;

use fantoccini::error::CmdError;

use crate::browser::{Control, PageDriver};
use crate::error::{HarvestError, Result};

#[derive(Debug, Clone, Default)]
pub struct MockPage {
    pub title: String,
    pub text: String,
    /// URL the "next" control leads to; `None` means no control on the page
    pub next: Option<String>,
    pub source: String,
}

/// A scripted site: pages by URL, named controls, and knobs for failures
#[derive(Debug, Default)]
pub struct MockSite {
    pub pages: HashMap<String, MockPage>,
    /// Target-list controls: label -> URL they navigate to
    pub targets: HashMap<String, String>,
    /// Labels whose click fails with a driver error
    pub broken_targets: Vec<String>,
    /// Dismissal controls present on the page (button text or selector)
    pub overlays: Vec<String>,
    /// Dismissal controls whose click fails with a driver error
    pub broken_overlays: Vec<String>,
    pub current: String,
    pub fail_navigation: bool,
    /// How long `goto` takes
    pub goto_delay: Duration,
    /// Every network-idle wait: the page URL and the bound it was given
    pub idle_waits: Vec<(String, Duration)>,
    pub empty_screenshot: bool,
    /// Page whose PDF print fails with a driver error
    pub fail_pdf_at: Option<String>,
    /// Scroll height of every page
    pub height: u64,
    /// Added to the height each time it is read
    pub height_growth: u64,
    pub scroll_steps: u32,
    pub clicks: Vec<String>,
    pub closed: bool,
}

impl MockSite {
    pub fn new() -> Self {
        Self {
            height: 1000,
            ..Self::default()
        }
    }

    pub fn page(mut self, url: &str, title: &str, next: Option<&str>) -> Self {
        self.pages.insert(
            url.to_string(),
            MockPage {
                title: title.to_string(),
                text: format!("{}\n\n\n\nbody of {}", title, url),
                next: next.map(str::to_string),
                source: String::new(),
            },
        );
        self
    }

    pub fn target(mut self, label: &str, url: &str) -> Self {
        self.targets.insert(label.to_string(), url.to_string());
        self
    }

    fn current_page(&self) -> Option<&MockPage> {
        let key = self.current.split('#').next().unwrap_or_default();
        self.pages.get(key)
    }
}

impl PageDriver for MockSite {
    async fn goto(&mut self, url: &str) -> Result<()> {
        if self.fail_navigation {
            return Err(HarvestError::NavigationFailed {
                url: url.to_string(),
                reason: "connection refused".to_string(),
            });
        }
        if !self.goto_delay.is_zero() {
            tokio::time::sleep(self.goto_delay).await;
        }
        self.current = url.to_string();
        Ok(())
    }

    async fn wait_for_network_idle(&mut self, timeout: Duration) -> Result<()> {
        self.idle_waits.push((self.current.clone(), timeout));
        Ok(())
    }

    async fn current_url(&mut self) -> Result<String> {
        Ok(self.current.clone())
    }

    async fn title(&mut self) -> Result<String> {
        Ok(self
            .current_page()
            .map(|p| p.title.clone())
            .unwrap_or_default())
    }

    async fn click(&mut self, control: &Control, _wait: Duration) -> Result<Option<String>> {
        match control {
            Control::TextWithin { text, .. } => {
                let next = self.current_page().and_then(|p| p.next.clone());
                Ok(next.map(|url| {
                    self.clicks.push(format!("next:{}", url));
                    self.current = url;
                    text.clone()
                }))
            }
            Control::Role { name, .. } => {
                if self.broken_targets.contains(name) {
                    return Err(HarvestError::CaptureFailed {
                        artifact: "click",
                        reason: "element not interactable".to_string(),
                    });
                }
                Ok(self.targets.get(name).cloned().map(|url| {
                    self.clicks.push(format!("target:{}", name));
                    self.current = url;
                    name.clone()
                }))
            }
            Control::ButtonText(key) | Control::Css(key) => {
                if self.broken_overlays.contains(key) {
                    return Err(HarvestError::WebDriver(CmdError::NotW3C(
                        serde_json::Value::Null,
                    )));
                }
                if let Some(idx) = self.overlays.iter().position(|o| o == key) {
                    self.overlays.remove(idx);
                    self.clicks.push(format!("dismiss:{}", key));
                    Ok(Some(key.clone()))
                } else {
                    Ok(None)
                }
            }
        }
    }

    async fn scroll_by(&mut self, _px: u32) -> Result<()> {
        self.scroll_steps += 1;
        Ok(())
    }

    async fn scroll_height(&mut self) -> Result<u64> {
        self.height += self.height_growth;
        Ok(self.height)
    }

    async fn reset_scroll_clipping(&mut self, _container: Option<&str>) -> Result<()> {
        Ok(())
    }

    async fn screenshot_full_page(&mut self) -> Result<Vec<u8>> {
        if self.empty_screenshot {
            return Ok(Vec::new());
        }
        Ok(b"\x89PNG".to_vec())
    }

    async fn visible_text(&mut self) -> Result<String> {
        Ok(self
            .current_page()
            .map(|p| p.text.clone())
            .unwrap_or_default())
    }

    async fn print_pdf(&mut self) -> Result<Vec<u8>> {
        if self.fail_pdf_at.as_deref() == Some(self.current.as_str()) {
            return Err(HarvestError::WebDriver(CmdError::NotW3C(
                serde_json::Value::Null,
            )));
        }
        Ok(b"%PDF-1.4".to_vec())
    }

    async fn page_source(&mut self) -> Result<String> {
        Ok(self
            .current_page()
            .map(|p| p.source.clone())
            .unwrap_or_default())
    }

    async fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}
