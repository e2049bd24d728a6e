/// Tidies a `innerText` dump for writing to disk
///
/// - Trailing whitespace is stripped from every line
/// - Runs of blank lines collapse to a single blank line
/// - Leading and trailing blank lines are dropped
/// - The result ends with exactly one newline (empty input stays empty)
pub fn normalize_dump(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_blank = false;

    for line in text.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            pending_blank = !out.is_empty();
            continue;
        }
        if pending_blank {
            out.push('\n');
            pending_blank = false;
        }
        out.push_str(line);
        out.push('\n');
    }

    out
}
