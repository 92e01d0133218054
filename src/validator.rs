// src/validator.rs
//! Measures scraped content and applies the recognition rule.

use once_cell::sync::OnceCell;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::recognition::RecognitionCriteria;
use crate::scrape::ScrapedContent;

/// Length of the trimmed text, in characters.
pub fn count_chars_with_spaces(text: &str) -> usize {
    text.trim().chars().count()
}

/// Length after removing all whitespace and zero-width/format characters.
pub fn count_chars_no_spaces(text: &str) -> usize {
    static RE_INVISIBLE: OnceCell<Regex> = OnceCell::new();
    let re = RE_INVISIBLE
        .get_or_init(|| Regex::new(r"[\s\u{200B}-\u{200D}\u{2060}\u{FEFF}]+").expect("static regex"));
    re.replace_all(text.trim(), "").chars().count()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validation {
    pub char_count_no_spaces: usize,
    pub image_count: usize,
    pub is_valid: bool,
}

pub fn validate(content: &ScrapedContent, criteria: &RecognitionCriteria) -> Validation {
    let char_count_no_spaces = content.char_count_no_spaces;
    let image_count = content.images.len();
    Validation {
        char_count_no_spaces,
        image_count,
        is_valid: criteria.is_recognized(char_count_no_spaces, image_count),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invisible_characters_do_not_count() {
        let s = "  가 나\t다\n\u{200B}라\u{FEFF}마\u{00A0}바  ";
        assert_eq!(count_chars_no_spaces(s), 6);
        assert_eq!(count_chars_with_spaces("  ab c  "), 4);
    }

    #[test]
    fn validation_uses_kept_images() {
        let content = ScrapedContent {
            text: "x".repeat(1000),
            char_count_with_spaces: 1000,
            char_count_no_spaces: 1000,
            images: vec!["a".into(), "b".into(), "c".into()],
            discarded_images: 4,
        };
        let v = validate(&content, &RecognitionCriteria::default());
        assert!(v.is_valid);
        assert_eq!(v.image_count, 3);

        let fewer = ScrapedContent {
            images: vec!["a".into(), "b".into()],
            ..content
        };
        assert!(!validate(&fewer, &RecognitionCriteria::default()).is_valid);
    }
}
