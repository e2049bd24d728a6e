use base64::Engine;
use fantoccini::elements::Element;
use fantoccini::error::CmdError;
use fantoccini::wd::{Capabilities, WebDriverCompatibleCommand};
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::{Value, json};
use std::time::Duration;
use tokio::time::Instant;

use super::{Control, PageDriver, button_text_xpath, innermost_text_xpath, role_xpath, scripts};
use crate::config::HarvestConfig;
use crate::error::{HarvestError, Result};

/// Interval between lookups while waiting for a control to appear
const CONTROL_POLL: Duration = Duration::from_millis(250);

/// Interval between network activity probes
const IDLE_POLL: Duration = Duration::from_millis(500);

/// Chrome refuses to capture surfaces larger than this in either direction
const MAX_CAPTURE_PX: u64 = 16_384;

/// A4 in centimetres, the unit of the WebDriver print command
const A4_CM: (f64, f64) = (21.0, 29.7);

/// Common WebDriver endpoints tried when the configured one is unreachable
const FALLBACK_URLS: [&str; 2] = [
    "http://localhost:9515", // ChromeDriver default
    "http://127.0.0.1:4444", // Try with IP instead of localhost
];

/// A browser page driven over WebDriver
pub struct WebDriverPage {
    client: Client,
    closed: bool,
}

impl WebDriverPage {
    /// Opens a new session, trying common fallback endpoints if needed
    pub async fn connect(config: &HarvestConfig) -> Result<Self> {
        let caps = capabilities(config);

        let client = match connect_to(&config.webdriver_url, caps.clone()).await {
            Ok(client) => client,
            Err(first_error) => {
                ::log::error!(
                    "Failed to connect to WebDriver at {}: {}",
                    config.webdriver_url,
                    first_error
                );
                let mut fallback = None;
                for url in FALLBACK_URLS {
                    if url == config.webdriver_url {
                        continue;
                    }
                    ::log::info!("Trying fallback WebDriver URL: {}", url);
                    if let Ok(client) = connect_to(url, caps.clone()).await {
                        ::log::debug!("Connected to fallback WebDriver at {}", url);
                        fallback = Some(client);
                        break;
                    }
                }
                match fallback {
                    Some(client) => client,
                    None => {
                        ::log::error!(
                            "Make sure a WebDriver server is running or set the WEBDRIVER_URL environment variable"
                        );
                        return Err(first_error);
                    }
                }
            }
        };

        client
            .set_window_size(config.window_width, config.window_height)
            .await?;
        ::log::debug!(
            "Browser window set to {}x{}",
            config.window_width,
            config.window_height
        );

        Ok(Self {
            client,
            closed: false,
        })
    }

    async fn locate(&self, control: &Control) -> Result<Option<Element>> {
        let found = match control {
            Control::ButtonText(text) => {
                let xpath = button_text_xpath(text);
                self.client.find_all(Locator::XPath(&xpath)).await?.into_iter().next()
            }
            Control::Css(selector) => self
                .client
                .find_all(Locator::Css(selector))
                .await?
                .into_iter()
                .next(),
            Control::TextWithin { scope, text } => {
                let xpath = innermost_text_xpath(text);
                let mut last = None;
                for region in self.client.find_all(Locator::Css(scope)).await? {
                    if let Some(el) = region.find_all(Locator::XPath(&xpath)).await?.pop() {
                        last = Some(el);
                    }
                }
                last
            }
            Control::Role { role, name } => {
                let xpath = role_xpath(role, name);
                self.client.find_all(Locator::XPath(&xpath)).await?.into_iter().next()
            }
        };
        Ok(found)
    }

    async fn execute(&self, script: &str, args: Vec<Value>) -> Result<Value> {
        Ok(self.client.execute(script, args).await?)
    }
}

async fn connect_to(url: &str, caps: Capabilities) -> Result<Client> {
    let client = ClientBuilder::native()
        .capabilities(caps)
        .connect(url)
        .await
        .map_err(|source| HarvestError::Session {
            url: url.to_string(),
            source,
        })?;
    ::log::debug!("Connected to WebDriver at {}", url);
    Ok(client)
}

/// Session capabilities for Chrome and Firefox drivers
fn capabilities(config: &HarvestConfig) -> Capabilities {
    let mut caps = Capabilities::new();
    let window = format!("--window-size={},{}", config.window_width, config.window_height);

    let mut chrome_args = vec![window, "--disable-dev-shm-usage".to_string()];
    let mut firefox_args: Vec<String> = Vec::new();
    if config.headless {
        chrome_args.extend(["--headless=new", "--disable-gpu", "--no-sandbox"].map(String::from));
        firefox_args.push("-headless".to_string());
    }

    caps.insert("goog:chromeOptions".to_string(), json!({ "args": chrome_args }));
    caps.insert("moz:firefoxOptions".to_string(), json!({ "args": firefox_args }));
    caps
}

/// Window size for a full-page capture: at least the current window, at most
/// `MAX_CAPTURE_PX` in each direction
fn capture_size(document: (u64, u64), window: (u64, u64)) -> (u64, u64) {
    (
        document.0.max(window.0).min(MAX_CAPTURE_PX),
        document.1.max(window.1).min(MAX_CAPTURE_PX),
    )
}

fn clamp_u32(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

/// `POST /session/{id}/print`, which fantoccini does not wrap
#[derive(Debug)]
struct PrintPage {
    body: Value,
}

impl PrintPage {
    fn a4() -> Self {
        Self {
            body: json!({
                "pageSize": { "width": A4_CM.0, "height": A4_CM.1 },
                "background": true,
            }),
        }
    }
}

impl WebDriverCompatibleCommand for PrintPage {
    fn endpoint(
        &self,
        base_url: &url::Url,
        session_id: Option<&str>,
    ) -> std::result::Result<url::Url, url::ParseError> {
        base_url.join(&format!("session/{}/print", session_id.unwrap_or_default()))
    }

    fn method_and_body(&self, _request_url: &url::Url) -> (http::Method, Option<String>) {
        (http::Method::POST, Some(self.body.to_string()))
    }
}

/// The print command answers with the PDF as a base64 string
fn decode_pdf(value: Value) -> Result<Vec<u8>> {
    let Some(encoded) = value.as_str() else {
        return Err(CmdError::NotW3C(value).into());
    };
    base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| HarvestError::CaptureFailed {
            artifact: "PDF",
            reason: format!("invalid base64 in print response: {}", e),
        })
}

fn as_u64(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_f64().filter(|f| *f >= 0.0).map(|f| f.ceil() as u64))
}

impl PageDriver for WebDriverPage {
    async fn goto(&mut self, url: &str) -> Result<()> {
        self.client
            .goto(url)
            .await
            .map_err(|e| HarvestError::NavigationFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })
    }

    async fn wait_for_network_idle(&mut self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        let mut last_count = None;

        loop {
            let probe = self.execute(scripts::NETWORK_PROBE, vec![]).await?;
            let complete = probe[0].as_str() == Some("complete");
            let count = as_u64(&probe[1]);

            if complete && last_count.is_some() && last_count == count {
                ::log::debug!("Network idle with {:?} resources loaded", count);
                return Ok(());
            }
            last_count = if complete { count } else { None };

            if Instant::now() >= deadline {
                let url = self.current_url().await.unwrap_or_default();
                return Err(HarvestError::NavigationFailed {
                    url,
                    reason: format!(
                        "network still busy after {:.1}s",
                        timeout.as_secs_f64()
                    ),
                });
            }
            tokio::time::sleep(IDLE_POLL).await;
        }
    }

    async fn current_url(&mut self) -> Result<String> {
        Ok(self.client.current_url().await?.to_string())
    }

    async fn title(&mut self) -> Result<String> {
        Ok(self.client.title().await?)
    }

    async fn click(&mut self, control: &Control, wait: Duration) -> Result<Option<String>> {
        let deadline = Instant::now() + wait;

        loop {
            if let Some(el) = self.locate(control).await? {
                let text = el.text().await.unwrap_or_default();
                el.click().await?;
                return Ok(Some(text.trim().to_string()));
            }
            if Instant::now() >= deadline {
                ::log::trace!("No {} after {:?}", control, wait);
                return Ok(None);
            }
            tokio::time::sleep(CONTROL_POLL).await;
        }
    }

    async fn scroll_by(&mut self, px: u32) -> Result<()> {
        self.execute(scripts::SCROLL_BY, vec![json!(px)]).await?;
        Ok(())
    }

    async fn scroll_height(&mut self) -> Result<u64> {
        let height = self.execute(scripts::SCROLL_HEIGHT, vec![]).await?;
        Ok(as_u64(&height).unwrap_or(0))
    }

    async fn reset_scroll_clipping(&mut self, container: Option<&str>) -> Result<()> {
        self.execute(scripts::RESET_SCROLL_CLIPPING, vec![json!(container)])
            .await?;
        Ok(())
    }

    async fn screenshot_full_page(&mut self) -> Result<Vec<u8>> {
        let size = self.execute(scripts::DOCUMENT_SIZE, vec![]).await?;
        let doc_width = as_u64(&size[0]).unwrap_or(0);
        let doc_height = as_u64(&size[1]).unwrap_or(0);
        let chrome_width = as_u64(&size[2]).unwrap_or(0);
        let chrome_height = as_u64(&size[3]).unwrap_or(0);

        let (orig_width, orig_height) = self.client.get_window_size().await?;
        let (width, height) = capture_size(
            (doc_width + chrome_width, doc_height + chrome_height),
            (orig_width, orig_height),
        );
        if doc_height + chrome_height > MAX_CAPTURE_PX {
            ::log::warn!(
                "Document is {}px tall, screenshot truncated to {}px",
                doc_height,
                MAX_CAPTURE_PX
            );
        }

        let resized = (width, height) != (orig_width, orig_height);
        if resized {
            self.client
                .set_window_size(clamp_u32(width), clamp_u32(height))
                .await?;
        }
        let shot = self.client.screenshot().await;
        if resized {
            if let Err(e) = self
                .client
                .set_window_size(clamp_u32(orig_width), clamp_u32(orig_height))
                .await
            {
                ::log::warn!("Failed to restore window size: {}", e);
            }
        }

        Ok(shot?)
    }

    async fn visible_text(&mut self) -> Result<String> {
        let text = self.execute(scripts::VISIBLE_TEXT, vec![]).await?;
        Ok(text.as_str().unwrap_or_default().to_string())
    }

    async fn print_pdf(&mut self) -> Result<Vec<u8>> {
        let encoded = self.client.issue_cmd(PrintPage::a4()).await?;
        decode_pdf(encoded)
    }

    async fn page_source(&mut self) -> Result<String> {
        Ok(self.client.source().await?)
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.client.clone().close().await?;
        ::log::debug!("WebDriver session closed");
        Ok(())
    }
}
