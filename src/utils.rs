//! String helpers used in log output.

/// Truncate a string for logging purposes.
///
/// Scraped titles can be long (and on this site frequently mix English and
/// Devanagari), so truncation counts characters rather than bytes. Long
/// strings are cut at `max` characters with an ellipsis and a count of the
/// dropped characters appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 chars)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    let total = s.chars().count();
    if total <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max).collect();
        format!("{}…(+{} chars)", kept, total - max)
    }
}
