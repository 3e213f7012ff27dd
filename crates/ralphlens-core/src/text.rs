/// First `max_chars` characters of `text`.
pub(crate) fn excerpt(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Excerpt with newlines flattened to spaces, for one-line listings.
pub(crate) fn single_line(text: &str, max_chars: usize) -> String {
    excerpt(text, max_chars).replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excerpt_counts_chars_not_bytes() {
        assert_eq!(excerpt("héllo", 2), "hé");
        assert_eq!(excerpt("abc", 10), "abc");
    }

    #[test]
    fn test_single_line_flattens_newlines() {
        assert_eq!(single_line("a\nb\nc", 4), "a b ");
    }
}
