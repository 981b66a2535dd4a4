//! String utility functions for safe UTF-8 text manipulation

/// Truncate a string at a character boundary, adding an ellipsis if truncated.
///
/// Used for human-facing messages where a marker of elision is useful.
///
/// # Examples
/// ```
/// use hearth_bridge::utils::string::truncate_at_char_boundary;
///
/// assert_eq!(truncate_at_char_boundary("hello world", 5), "hello...");
/// assert_eq!(truncate_at_char_boundary("hello", 10), "hello");
/// ```
pub fn truncate_at_char_boundary(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}

/// Keep at most `max_chars` characters, with no marker appended.
///
/// The result never exceeds `max_chars` characters, and applying it twice is
/// the same as applying it once.
///
/// # Examples
/// ```
/// use hearth_bridge::utils::string::clamp_chars;
///
/// assert_eq!(clamp_chars("héllo wörld", 5), "héllo");
/// assert_eq!(clamp_chars("ok", 5), "ok");
/// ```
pub fn clamp_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => s[..byte_idx].to_string(),
        None => s.to_string(),
    }
}
