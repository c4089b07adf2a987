//! Small text helpers shared by the core and the transports.

/// Truncates a string to a maximum number of characters.
///
/// This is UTF-8 safe and will not panic on multi-byte characters.
///
/// # Examples
///
/// ```
/// use linkpick_core::utils::truncate_str;
/// let s = "Привет, мир!";
/// assert_eq!(truncate_str(s, 6), "Привет");
/// ```
pub fn truncate_str(s: impl AsRef<str>, max_chars: usize) -> String {
    let s = s.as_ref();
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    s.char_indices()
        .nth(max_chars)
        .map_or_else(|| s.to_string(), |(pos, _)| s[..pos].to_string())
}

/// Shorten a URL for log output, keeping scheme and host readable.
///
/// Signed media links carry long query strings that drown the logs.
#[must_use]
pub fn short_url(url: &str) -> String {
    const MAX_URL_LOG_CHARS: usize = 80;
    let without_query = url.split('?').next().unwrap_or(url);
    truncate_str(without_query, MAX_URL_LOG_CHARS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str_unicode() {
        let s = "Привет, мир!";
        assert_eq!(truncate_str(s, 6), "Привет");
        assert_eq!(truncate_str(s, 50), "Привет, мир!");
    }

    #[test]
    fn test_short_url_drops_query() {
        assert_eq!(
            short_url("https://rr1.cdn.example/videoplayback?expire=1&sig=abc"),
            "https://rr1.cdn.example/videoplayback"
        );
    }
}
