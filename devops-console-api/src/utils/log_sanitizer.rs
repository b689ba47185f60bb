//! Log sanitization utilities
//!
//! Keeps large response bodies (pipeline Jenkinsfiles, full project
//! objects with secrets references) out of debug/error logs.

/// Maximum number of characters to include in truncated log output.
const TRUNCATE_LIMIT: usize = 256;

/// Truncate a string for safe logging.
///
/// Strings of at most `TRUNCATE_LIMIT` characters are returned unchanged;
/// longer ones are cut on a character boundary and suffixed with the total
/// byte length.
pub fn truncate_for_log(s: &str) -> String {
    match s.char_indices().nth(TRUNCATE_LIMIT) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}... [truncated, total {} bytes]", &s[..cut], s.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_string_unchanged() {
        let s = r#"{"items":[]}"#;
        assert_eq!(truncate_for_log(s), s);
    }

    #[test]
    fn exactly_at_limit() {
        let s = "a".repeat(TRUNCATE_LIMIT);
        assert_eq!(truncate_for_log(&s), s);
    }

    #[test]
    fn over_limit_truncated() {
        let s = "a".repeat(TRUNCATE_LIMIT + 100);
        let result = truncate_for_log(&s);
        assert!(result.starts_with(&"a".repeat(TRUNCATE_LIMIT)));
        assert!(result.ends_with(&format!("total {} bytes]", TRUNCATE_LIMIT + 100)));
    }

    #[test]
    fn multibyte_chars_counted_as_chars() {
        let s = "流水线".repeat(100);
        let result = truncate_for_log(&s);
        assert!(result.contains("... [truncated, total 900 bytes]"));
    }
}
