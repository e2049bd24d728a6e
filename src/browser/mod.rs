//! Browser session abstraction.
//!
//! The harvester only talks to a [`PageDriver`]; [`webdriver::WebDriverPage`]
//! implements it over the W3C WebDriver protocol with `fantoccini`.

pub mod scripts;
pub mod webdriver;

use std::time::Duration;

use crate::error::Result;
use crate::utils::xpath_literal;

pub use webdriver::WebDriverPage;

/// A clickable control on the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Control {
    /// First button whose text contains the string
    ButtonText(String),
    /// First element matched by a CSS selector
    Css(String),
    /// Last element inside `scope` (CSS) whose text contains `text`
    TextWithin { scope: String, text: String },
    /// First element with the given accessible role and exact name
    Role { role: String, name: String },
}

impl std::fmt::Display for Control {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Control::ButtonText(text) => write!(f, "button containing '{}'", text),
            Control::Css(selector) => write!(f, "'{}'", selector),
            Control::TextWithin { scope, text } => write!(f, "'{}' inside {}", text, scope),
            Control::Role { role, name } => write!(f, "{} named '{}'", role, name),
        }
    }
}

/// XPath matching an element by accessible role and exact, whitespace-normalized name
pub fn role_xpath(role: &str, name: &str) -> String {
    let name = xpath_literal(name);
    let native = match role {
        "button" => " or self::button or (self::input and (@type='button' or @type='submit'))",
        "link" => " or self::a[@href]",
        _ => "",
    };
    format!(
        "//*[@role={}{}][normalize-space(.)={} or normalize-space(@aria-label)={} or normalize-space(@value)={}]",
        xpath_literal(role),
        native,
        name,
        name,
        name
    )
}

/// XPath matching buttons whose text contains `text`
pub fn button_text_xpath(text: &str) -> String {
    format!(
        "//*[self::button or @role='button'][contains(normalize-space(.), {})]",
        xpath_literal(text)
    )
}

/// Relative XPath matching the innermost descendants whose text contains `text`
pub fn innermost_text_xpath(text: &str) -> String {
    let text = xpath_literal(text);
    format!(
        ".//*[contains(normalize-space(.), {})][not(.//*[contains(normalize-space(.), {})])]",
        text, text
    )
}

/// Operations the harvester needs from a browser page
///
/// Methods take `&mut self` because a page is owned by exactly one run.
#[allow(async_fn_in_trait)]
pub trait PageDriver {
    /// Navigate to `url`
    async fn goto(&mut self, url: &str) -> Result<()>;

    /// Wait until the document is loaded and no new resources are being fetched
    async fn wait_for_network_idle(&mut self, timeout: Duration) -> Result<()>;

    async fn current_url(&mut self) -> Result<String>;

    async fn title(&mut self) -> Result<String>;

    /// Clicks `control` if it appears within `wait`, returning its display text.
    /// `Ok(None)` means the control was not found.
    async fn click(&mut self, control: &Control, wait: Duration) -> Result<Option<String>>;

    async fn scroll_by(&mut self, px: u32) -> Result<()>;

    /// Current total scrollable height of the document in pixels
    async fn scroll_height(&mut self) -> Result<u64>;

    /// Removes height limits and overflow clipping so a capture shows everything
    async fn reset_scroll_clipping(&mut self, container: Option<&str>) -> Result<()>;

    /// PNG of the whole document, not just the viewport
    async fn screenshot_full_page(&mut self) -> Result<Vec<u8>>;

    /// Rendered visible text of the body
    async fn visible_text(&mut self) -> Result<String>;

    /// A4 PDF render of the current page
    async fn print_pdf(&mut self) -> Result<Vec<u8>>;

    async fn page_source(&mut self) -> Result<String>;

    /// Ends the browser session
    async fn close(&mut self) -> Result<()>;
}
