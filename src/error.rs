// src/error.rs
//! Error taxonomy for the ingest pipeline.
//!
//! Severity is encoded by type, not by variant: [`FeedError`] ends one
//! source's turn, [`ScrapeError`] and [`StoreError`] (during item handling)
//! skip one item, and [`PipelineError`] aborts the whole run.

use thiserror::Error;

/// Source-level failures. The orchestrator logs these and moves on to the
/// next source.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("source has no feed url and none can be derived from {site_url:?}")]
    NoFeedUrl { site_url: String },

    #[error("feed unavailable at {url}: {reason}")]
    Unavailable { url: String, reason: String },

    #[error("feed at {url} is not valid RSS/Atom: {reason}")]
    Unparseable { url: String, reason: String },
}

impl FeedError {
    pub fn unparseable(url: &str, reason: impl Into<String>) -> Self {
        FeedError::Unparseable {
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    pub fn unavailable(url: &str, reason: impl Into<String>) -> Self {
        FeedError::Unavailable {
            url: url.to_string(),
            reason: reason.into(),
        }
    }
}

/// Item-level failures raised while rendering or measuring a post.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("navigation to {url} did not settle within {timeout_secs}s")]
    NavigationTimeout { url: String, timeout_secs: u64 },

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("no content container matched on {url}")]
    ContentContainerNotFound { url: String },
}

impl ScrapeError {
    /// Short label used as a metrics/log field.
    pub fn kind(&self) -> &'static str {
        match self {
            ScrapeError::NavigationTimeout { .. } => "navigation_timeout",
            ScrapeError::Navigation { .. } => "navigation",
            ScrapeError::ContentContainerNotFound { .. } => "container_not_found",
        }
    }
}

/// Failures of the document store boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("document (de)serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("document {collection}/{id} not found")]
    NotFound { collection: String, id: String },

    #[error("store backend error: {0}")]
    Backend(String),
}

/// Raised when the browser session cannot be opened. Fatal to the run.
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("browser launch failed: {0}")]
    Launch(String),
}

/// Run-fatal conditions.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    BrowserLaunch(#[from] BrowserError),

    #[error("listing active sources failed: {0}")]
    Store(#[from] StoreError),
}
