const ELLIPSIS: char = '…';

/// First `max` characters of `text`, cut on a char boundary.
pub fn prefix_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Shortens `text` to at most `max` characters, ending in `…` when cut.
pub fn truncate_with_ellipsis(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out = prefix_chars(text, max - 1).trim_end().to_string();
    out.push(ELLIPSIS);
    out
}

/// Replaces every run of whitespace with a single space and trims the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_respects_multibyte_chars() {
        assert_eq!(prefix_chars("h\u{e9}llo", 2), "h\u{e9}");
        assert_eq!(prefix_chars("abc", 10), "abc");
    }

    #[test]
    fn truncation_never_exceeds_limit() {
        let long = "x".repeat(120);
        let cut = truncate_with_ellipsis(&long, 50);
        assert_eq!(cut.chars().count(), 50);
        assert!(cut.ends_with('…'));
        assert_eq!(truncate_with_ellipsis("short", 50), "short");
    }

    #[test]
    fn collapses_runs_of_whitespace() {
        assert_eq!(collapse_whitespace("  a \n\t b  c "), "a b c");
    }
}
