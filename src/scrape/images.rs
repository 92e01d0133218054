// src/scrape/images.rs
//! Which `<img>` elements count as content images.
//!
//! The heuristics are template-specific (map tiles, marker icons, tracking
//! pixels) and live only here and in the scrape profile, so new templates
//! never touch validation.

use serde::{Deserialize, Serialize};

fn default_min_data_uri_len() -> usize {
    200
}

fn default_min_dimension() -> u32 {
    30
}

fn default_blocked_patterns() -> Vec<String> {
    [
        "map.pstatic.net/nrb/",
        "common-icon-places-marker",
        "ssl.pstatic.net/static/maps/mantle/",
        "simg.pstatic.net/static.map/v2/map/staticmap.bin",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageFilter {
    /// Substrings of `src` that mark map tiles and widget chrome.
    #[serde(default = "default_blocked_patterns")]
    pub blocked_src_patterns: Vec<String>,
    /// Inline `data:image/` URIs shorter than this are icons/placeholders.
    #[serde(default = "default_min_data_uri_len")]
    pub min_data_uri_len: usize,
    /// Declared width or height below this many pixels drops the image.
    #[serde(default = "default_min_dimension")]
    pub min_dimension: u32,
}

impl Default for ImageFilter {
    fn default() -> Self {
        Self {
            blocked_src_patterns: default_blocked_patterns(),
            min_data_uri_len: default_min_data_uri_len(),
            min_dimension: default_min_dimension(),
        }
    }
}

impl ImageFilter {
    /// `width`/`height` are the raw attribute values, if declared.
    pub fn keep(&self, src: &str, width: Option<&str>, height: Option<&str>) -> bool {
        if self
            .blocked_src_patterns
            .iter()
            .any(|p| !p.is_empty() && src.contains(p.as_str()))
        {
            return false;
        }
        if src.starts_with("data:image/") && src.len() < self.min_data_uri_len {
            return false;
        }
        let too_small = |dim: Option<&str>| {
            declared_pixels(dim).is_some_and(|px| px > 0 && px < self.min_dimension)
        };
        !(too_small(width) || too_small(height))
    }
}

/// Leading integer of a dimension attribute (`"24"`, `"24px"`, `"24.5"`).
/// Percentages and garbage count as undeclared.
fn declared_pixels(raw: Option<&str>) -> Option<u32> {
    let raw = raw?.trim();
    if raw.ends_with('%') {
        return None;
    }
    let digits: String = raw.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}
