/// Characters that are not allowed in file names on common platforms
const ILLEGAL_FILENAME_CHARS: [char; 9] = ['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Convert a string to a sanitized filename
///
/// Each illegal character is replaced by a single underscore, so the length
/// in characters is unchanged.
pub fn sanitize_filename(name: &str) -> String {
    name.replace(ILLEGAL_FILENAME_CHARS, "_")
}

/// Base name for a linked-list page: zero-padded (width 2) sequence, then title
pub fn artifact_base_name(sequence: u32, title: &str) -> String {
    sanitize_filename(&format!("{:02}_{}", sequence, title))
}

/// Base name for a target-list page: the label alone
pub fn label_base_name(label: &str) -> String {
    sanitize_filename(label)
}

/// Removes a site-wide title suffix such as " - Developer Portal"
pub fn strip_title_suffix<'a>(title: &'a str, suffix: Option<&str>) -> &'a str {
    let title = title.trim();
    match suffix {
        Some(suffix) if !suffix.is_empty() => {
            title.strip_suffix(suffix).unwrap_or(title).trim_end()
        }
        _ => title,
    }
}

/// Quotes a string as an XPath 1.0 literal
///
/// XPath has no escape sequences, so a value containing both quote kinds is
/// spliced together with `concat()`.
pub fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        format!("'{}'", value)
    } else if !value.contains('"') {
        format!("\"{}\"", value)
    } else {
        let parts: Vec<String> = value
            .split('\'')
            .map(|part| format!("'{}'", part))
            .collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}
