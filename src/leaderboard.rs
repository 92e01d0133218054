// src/leaderboard.rs
//! Standings derived from the stored aggregates.
//!
//! Competition ranking: equal `valid_posts` share a rank and the next rank
//! skips (1, 1, 3). Ties are listed by most recent post first; sources that
//! never posted go last.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::Source;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedSource {
    pub rank: usize,
    pub source_id: String,
    pub name: String,
    pub valid_posts: u32,
    pub total_posts: u32,
    pub last_post_date: Option<DateTime<Utc>>,
}

fn standing_order(a: &Source, b: &Source) -> Ordering {
    b.valid_posts
        .cmp(&a.valid_posts)
        .then_with(|| match (a.last_post_date, b.last_post_date) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.id.cmp(&b.id))
}

pub fn rank_sources(sources: &[Source]) -> Vec<RankedSource> {
    let mut sorted: Vec<&Source> = sources.iter().collect();
    sorted.sort_by(|a, b| standing_order(a, b));

    let mut out = Vec::with_capacity(sorted.len());
    let mut rank = 0;
    let mut prev: Option<u32> = None;
    for (i, s) in sorted.into_iter().enumerate() {
        if prev != Some(s.valid_posts) {
            rank = i + 1;
            prev = Some(s.valid_posts);
        }
        out.push(RankedSource {
            rank,
            source_id: s.id.clone(),
            name: s.display_name().to_string(),
            valid_posts: s.valid_posts,
            total_posts: s.total_posts,
            last_post_date: s.last_post_date,
        });
    }
    out
}
