// src/config/scrape.rs
//! Scrape profile: which selectors isolate a post on the supported blog
//! templates and which images are chrome rather than content.
//!
//! Loaded from `$SCRAPE_PROFILE_PATH`, then `config/scrape_profile.toml`,
//! then `config/scrape_profile.json`, else the built-in default.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::scrape::images::ImageFilter;

pub const ENV_PROFILE_PATH: &str = "SCRAPE_PROFILE_PATH";

fn default_frames() -> Vec<String> {
    vec!["iframe#mainFrame".into()]
}

fn default_containers() -> Vec<String> {
    [
        // Naver SmartEditor ONE, then the legacy editor
        "div.se-main-container",
        "div#postViewArea",
        // Tistory
        "div.tt_article_useless_p_margin",
        // WordPress
        "div.entry-content",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_removals() -> Vec<String> {
    [
        "div.se-module.se-module-map-text",
        "div.se-module.se-module-map-image",
        ".map_polyvore",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeProfile {
    /// Iframes whose document holds the actual post.
    #[serde(default = "default_frames")]
    pub frame_selectors: Vec<String>,
    /// Tried in order; first match is the content container.
    #[serde(default = "default_containers")]
    pub container_selectors: Vec<String>,
    /// Subtrees dropped before measuring (map widgets and the like).
    #[serde(default = "default_removals")]
    pub remove_selectors: Vec<String>,
    #[serde(default)]
    pub image_filter: ImageFilter,
}

impl Default for ScrapeProfile {
    fn default() -> Self {
        Self {
            frame_selectors: default_frames(),
            container_selectors: default_containers(),
            remove_selectors: default_removals(),
            image_filter: ImageFilter::default(),
        }
    }
}

/// Load a profile from an explicit path. Supports TOML or JSON formats.
pub fn load_profile_from(path: &Path) -> Result<ScrapeProfile> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading scrape profile from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_profile(&content, &ext).with_context(|| format!("parsing {}", path.display()))
}

pub fn load_profile_default() -> Result<ScrapeProfile> {
    if let Ok(p) = std::env::var(ENV_PROFILE_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_profile_from(&pb);
        }
        return Err(anyhow!("{ENV_PROFILE_PATH} points to non-existent path"));
    }
    let toml_p = PathBuf::from("config/scrape_profile.toml");
    if toml_p.exists() {
        return load_profile_from(&toml_p);
    }
    let json_p = PathBuf::from("config/scrape_profile.json");
    if json_p.exists() {
        return load_profile_from(&json_p);
    }
    Ok(ScrapeProfile::default())
}

fn parse_profile(s: &str, hint_ext: &str) -> Result<ScrapeProfile> {
    match hint_ext {
        "toml" => Ok(toml::from_str(s)?),
        "json" => Ok(serde_json::from_str(s)?),
        _ => serde_json::from_str(s)
            .map_err(anyhow::Error::from)
            .or_else(|_| toml::from_str(s).map_err(anyhow::Error::from))
            .context("scrape profile is neither JSON nor TOML"),
    }
}
