//! Text utilities shared by ingestion and search.
//!
//! "Folded" text has diacritics removed and is lowercased, so that
//! `"Áo sơ mi Đen"` and `"ao so mi den"` compare equal. Vietnamese `đ`
//! is not a combining sequence under NFD and is mapped explicitly.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Remove diacritics and lowercase.
pub fn fold(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| match c {
            'đ' | 'Đ' => 'd',
            other => other,
        })
        .collect::<String>()
        .to_lowercase()
}

/// Collapse runs of whitespace into single spaces and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cut `text` to at most `max_chars` characters, on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_vietnamese() {
        assert_eq!(fold("Áo Sơ Mi Đi Làm"), "ao so mi di lam");
        assert_eq!(fold("giá 300000"), "gia 300000");
        assert_eq!(fold("đầm dự tiệc"), "dam du tiec");
    }

    #[test]
    fn test_fold_ascii_is_lowercase() {
        assert_eq!(fold("Office Shirt"), "office shirt");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \n\t b   c "), "a b c");
    }

    #[test]
    fn test_truncate_chars_multibyte() {
        assert_eq!(truncate_chars("đầm đẹp", 3), "đầm");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("", 0), "");
    }
}
