// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod identity;
pub mod ingest;
pub mod leaderboard;
pub mod model;
pub mod pipeline;
pub mod recognition;
pub mod scrape;
pub mod store;
pub mod telemetry;
pub mod timezone;
pub mod validator;

// ---- Re-exports for stable public API ----
pub use crate::error::{BrowserError, FeedError, PipelineError, ScrapeError, StoreError};
pub use crate::pipeline::{Pipeline, RunSummary, SourceReport};
pub use crate::recognition::{is_recognized, RecognitionCriteria};
pub use crate::timezone::ChallengeWindow;
