//! JavaScript snippets executed in the page through WebDriver `execute`.

/// `[readyState, number of resource timing entries]`
pub const NETWORK_PROBE: &str =
    "return [document.readyState, performance.getEntriesByType('resource').length];";

/// Scrolls the window down by `arguments[0]` pixels
pub const SCROLL_BY: &str = "window.scrollBy(0, arguments[0]);";

pub const SCROLL_HEIGHT: &str = "return document.body ? document.body.scrollHeight : 0;";

/// Un-clips the container matched by `arguments[0]` (may be null) and the document
pub const RESET_SCROLL_CLIPPING: &str = r#"
const selector = arguments[0];
if (selector) {
    const box = document.querySelector(selector);
    if (box) {
        box.style.height = 'auto';
        box.style.maxHeight = 'none';
        box.style.overflow = 'visible';
    }
}
document.body.style.overflow = 'visible';
document.documentElement.style.overflow = 'visible';
"#;

/// `[document width, document height, window chrome width, window chrome height]`
pub const DOCUMENT_SIZE: &str = r#"
const doc = document.documentElement;
const body = document.body || doc;
return [
    Math.max(doc.scrollWidth, body.scrollWidth),
    Math.max(doc.scrollHeight, body.scrollHeight),
    Math.max(window.outerWidth - window.innerWidth, 0),
    Math.max(window.outerHeight - window.innerHeight, 0)
];
"#;

pub const VISIBLE_TEXT: &str = "return document.body ? document.body.innerText : '';";
