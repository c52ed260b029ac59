//! String utilities for the domain layer.

/// Truncate a string to a maximum length with ellipsis (UTF-8 safe)
///
/// Uses byte length for max_len but ensures truncation occurs at valid
/// UTF-8 character boundaries.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        let target = max_len.saturating_sub(3);
        let mut end = target.min(s.len());
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &s[..end])
    }
}

/// Keep at most `max_chars` characters, without an ellipsis.
///
/// Used where a stored field has a hard character cap (resolution texts,
/// fallback summaries).
pub fn clip_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_ascii() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 8), "hello...");
    }

    #[test]
    fn test_truncate_multibyte() {
        assert_eq!(truncate("财政部备忘录", 30), "财政部备忘录");
        // 3 bytes per char: target=9 -> three chars
        assert_eq!(truncate("财政部备忘录完成", 12), "财政部...");
    }

    #[test]
    fn test_clip_chars() {
        assert_eq!(clip_chars("abcdef", 3), "abc");
        assert_eq!(clip_chars("财政部备忘录", 2), "财政");
        assert_eq!(clip_chars("ab", 10), "ab");
    }
}
