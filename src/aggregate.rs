// src/aggregate.rs
//! Per-source aggregates, always recomputed from the persisted post set.
//!
//! Never applied as deltas: a run that dies halfway still leaves the source
//! consistent with whatever posts exist.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::model::Post;
use crate::store::Repository;
use crate::timezone::ChallengeWindow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Aggregates {
    pub total_posts: u32,
    pub valid_posts: u32,
    pub last_post_date: Option<DateTime<Utc>>,
}

/// Counts are restricted to posts published inside the window;
/// `last_post_date` is the newest publish time across all of the posts.
pub fn tally(posts: &[Post], window: &ChallengeWindow) -> Aggregates {
    let mut agg = Aggregates::default();
    for p in posts {
        if window.contains(p.date) {
            agg.total_posts += 1;
            if p.is_valid {
                agg.valid_posts += 1;
            }
        }
        agg.last_post_date = Some(match agg.last_post_date {
            Some(d) if d >= p.date => d,
            _ => p.date,
        });
    }
    agg
}

/// Load every post for `source_id`, tally, and write the result back.
pub async fn recompute(
    repo: &Repository<'_>,
    source_id: &str,
    window: &ChallengeWindow,
) -> Result<Aggregates, StoreError> {
    let posts = repo.posts_for_source(source_id).await?;
    let agg = tally(&posts, window);
    repo.update_source_aggregates(source_id, &agg).await?;
    Ok(agg)
}
