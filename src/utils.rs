//! Text helpers shared by the scrapers, the summarizer and logging.
//!
//! - Word-limit truncation for article bodies
//! - Paragraph-break collapsing for streamed summaries
//! - Log-safe truncation of long payloads

/// Keep at most `max_words` whitespace-delimited words, joined by single spaces.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_words("a  b\nc d", 3), "a b c");
/// ```
pub fn truncate_words(text: &str, max_words: usize) -> String {
    text.split_whitespace()
        .take(max_words)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Replace every blank-line paragraph break (`"\n\n"`) with a single space.
pub fn collapse_paragraph_breaks(text: &str) -> String {
    text.replace("\n\n", " ")
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes, backing off to the nearest
/// character boundary, with `"…(+N bytes)"` appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}
