//! Small text helpers shared by the phases.

/// Quote pairs stripped from model output.
const QUOTE_PAIRS: &[(char, char)] = &[('"', '"'), ('\'', '\''), ('“', '”')];

/// Take at most `max_chars` characters from the start of `text`.
///
/// Counts characters, not bytes, so multi-byte text is never split.
pub fn excerpt(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Trim whitespace and remove one pair of wrapping quotes, if present.
///
/// # Examples
///
/// ```
/// use evol_core::text::strip_wrapping_quotes;
///
/// assert_eq!(strip_wrapping_quotes("\"What is FAFSA?\""), "What is FAFSA?");
/// assert_eq!(strip_wrapping_quotes("\"\"Nested\"\""), "\"Nested\"");
/// assert_eq!(strip_wrapping_quotes("Plain?"), "Plain?");
/// ```
pub fn strip_wrapping_quotes(text: &str) -> String {
    let trimmed = text.trim();
    for (open, close) in QUOTE_PAIRS {
        if trimmed.chars().count() >= 2 && trimmed.starts_with(*open) && trimmed.ends_with(*close)
        {
            let inner = &trimmed[open.len_utf8()..trimmed.len() - close.len_utf8()];
            return inner.to_string();
        }
    }
    trimmed.to_string()
}

/// One-line preview for log messages.
pub fn preview(text: &str, max_chars: usize) -> String {
    let line = text.replace('\n', " ");
    let cut = excerpt(&line, max_chars);
    if cut.len() < line.len() {
        format!("{}...", cut)
    } else {
        line
    }
}
