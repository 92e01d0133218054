// src/model.rs
//! Documents persisted by the pipeline. Field names are camelCase to match
//! what the dashboard reads from the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const SOURCES: &str = "campuses";
pub const POSTS: &str = "posts";
pub const SYSTEM: &str = "system";
pub const RUN_STATUS_ID: &str = "scraper_status";

/// A tracked campus blog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    /// Document id; not stored inside the document itself.
    #[serde(skip)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feed_url: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub total_posts: u32,
    #[serde(default)]
    pub valid_posts: u32,
    #[serde(default)]
    pub last_post_date: Option<DateTime<Utc>>,
}

impl Source {
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

/// One discovered article. Immutable once created, apart from `feedback`,
/// which belongs to the admin workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(skip)]
    pub id: String,
    pub campus_id: String,
    /// Display ordinal only.
    #[serde(default)]
    pub number: u32,
    #[serde(default)]
    pub title: String,
    pub url: String,
    /// Character count without whitespace.
    #[serde(default)]
    pub word_count: u32,
    #[serde(default)]
    pub image_count: u32,
    #[serde(default)]
    pub is_valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    /// Publish timestamp from the feed.
    pub date: DateTime<Utc>,
    /// Absent on posts entered by hand through the dashboard.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scraped_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Running,
    Completed,
    Error,
}

/// `system/scraper_status`, read by the dashboard to show the last run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStatus {
    pub status: RunState,
    pub last_updated: DateTime<Utc>,
    pub total_processed: u32,
    pub message: String,
}
