// src/recognition.rs
//! Recognition rule: a post counts toward the challenge only when it has
//! enough text *and* enough content images. There is no partial credit.

use serde::{Deserialize, Serialize};

pub const DEFAULT_MIN_CHARS: usize = 1000;
pub const DEFAULT_MIN_IMAGES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionCriteria {
    /// Minimum character count with all whitespace removed.
    pub min_chars: usize,
    pub min_images: usize,
}

impl Default for RecognitionCriteria {
    fn default() -> Self {
        Self {
            min_chars: DEFAULT_MIN_CHARS,
            min_images: DEFAULT_MIN_IMAGES,
        }
    }
}

impl RecognitionCriteria {
    pub fn is_recognized(&self, char_count_no_spaces: usize, image_count: usize) -> bool {
        char_count_no_spaces >= self.min_chars && image_count >= self.min_images
    }
}

/// Rule with the default thresholds (1000 chars, 3 images).
pub fn is_recognized(char_count_no_spaces: usize, image_count: usize) -> bool {
    RecognitionCriteria::default().is_recognized(char_count_no_spaces, image_count)
}
