// src/ingest/types.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FeedError;

/// One candidate post after feed normalization. Downstream code only ever
/// sees this shape, whatever the feed dialect was.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub published_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedFormat {
    Rss,
    Atom,
}

/// `<link>` as it appears in the wild: a bare URL (RSS) or a set of
/// rel/href pairs (Atom).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedLink {
    DirectUrl(String),
    AlternateLinks(Vec<LinkRel>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRel {
    pub rel: Option<String>,
    pub href: Option<String>,
}

impl FeedLink {
    /// Prefer `rel="alternate"` (Atom's default when `rel` is missing),
    /// otherwise the first link with an href.
    pub fn resolve(&self) -> Option<String> {
        let url = match self {
            FeedLink::DirectUrl(u) => Some(u.trim().to_string()),
            FeedLink::AlternateLinks(links) => links
                .iter()
                .find(|l| l.rel.as_deref().map_or(true, |r| r == "alternate") && l.href.is_some())
                .or_else(|| links.iter().find(|l| l.href.is_some()))
                .and_then(|l| l.href.as_deref())
                .map(|h| h.trim().to_string()),
        };
        url.filter(|u| !u.is_empty())
    }
}

/// Text constructs: plain RSS strings, or Atom text with a `type` attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedText {
    Plain(String),
    Typed { kind: Option<String>, value: String },
}

impl FeedText {
    pub fn resolve(&self) -> String {
        match self {
            FeedText::Plain(s) => super::normalize_title(s),
            FeedText::Typed { kind, value } => match kind.as_deref() {
                Some("html") | Some("xhtml") => super::normalize_title(value),
                _ => super::collapse_ws(value),
            },
        }
    }
}

#[async_trait]
pub trait FeedReader: Send + Sync {
    /// An empty feed is `Ok(vec![])`, not an error.
    async fn fetch_feed(&self, feed_url: &str) -> Result<Vec<FeedItem>, FeedError>;
}
