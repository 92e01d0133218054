// src/pipeline/state.rs
//! Per-source state machine and the pure per-item decisions.
//!
//! The orchestrator performs exactly one side effect between decisions
//! (fetch, lookup, scrape, persist, recompute); everything here is pure so
//! skip/reuse semantics can be tested without I/O.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::ingest::FeedItem;
use crate::model::Post;
use crate::timezone::ChallengeWindow;
use crate::validator::Validation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SourceState {
    Idle,
    FeedFetching,
    ItemProcessing { index: usize, total: usize },
    Aggregating,
    Done,
    /// Terminal; reachable from `FeedFetching` only.
    SourceFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEvent {
    Start,
    FeedLoaded { items: usize },
    FeedFailed,
    ItemResolved,
    AggregationFinished,
}

impl SourceState {
    /// `None` for transitions the machine does not allow.
    pub fn next(self, event: SourceEvent) -> Option<SourceState> {
        use SourceEvent as E;
        use SourceState as S;
        match (self, event) {
            (S::Idle, E::Start) => Some(S::FeedFetching),
            (S::FeedFetching, E::FeedFailed) => Some(S::SourceFailed),
            (S::FeedFetching, E::FeedLoaded { items: 0 }) => Some(S::Aggregating),
            (S::FeedFetching, E::FeedLoaded { items }) => Some(S::ItemProcessing {
                index: 0,
                total: items,
            }),
            (S::ItemProcessing { index, total }, E::ItemResolved) => {
                if index + 1 < total {
                    Some(S::ItemProcessing {
                        index: index + 1,
                        total,
                    })
                } else {
                    Some(S::Aggregating)
                }
            }
            (S::Aggregating, E::AggregationFinished) => Some(S::Done),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SourceState::Done | SourceState::SourceFailed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowVerdict {
    InWindow,
    OutsideWindow,
}

pub fn window_check(window: &ChallengeWindow, item: &FeedItem) -> WindowVerdict {
    if window.contains(item.published_at) {
        WindowVerdict::InWindow
    } else {
        WindowVerdict::OutsideWindow
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DedupDecision {
    ReuseExisting(Post),
    Scrape,
}

pub fn dedup_decision(existing: Option<Post>) -> DedupDecision {
    match existing {
        Some(post) => DedupDecision::ReuseExisting(post),
        None => DedupDecision::Scrape,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailedStage {
    DedupLookup,
    Scrape,
    Persist,
}

/// How one feed item was resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ItemOutcome {
    OutsideWindow,
    Reused { post_id: String, is_valid: bool },
    Created { post_id: String, is_valid: bool },
    Skipped { stage: FailedStage, reason: String },
}

/// The record stored for a freshly scraped item. `feedback` is left to the
/// admin workflow.
pub fn build_post(
    source_id: &str,
    post_id: String,
    number: u32,
    item: &FeedItem,
    canonical_url: String,
    validation: &Validation,
    scraped_at: DateTime<Utc>,
) -> Post {
    Post {
        id: post_id,
        campus_id: source_id.to_string(),
        number,
        title: item.title.clone(),
        url: canonical_url,
        word_count: u32::try_from(validation.char_count_no_spaces).unwrap_or(u32::MAX),
        image_count: u32::try_from(validation.image_count).unwrap_or(u32::MAX),
        is_valid: validation.is_valid,
        feedback: None,
        date: item.published_at,
        scraped_at: Some(scraped_at),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timezone::parse_instant;

    #[test]
    fn happy_path_walks_every_item_then_aggregates() {
        let mut s = SourceState::Idle;
        s = s.next(SourceEvent::Start).unwrap();
        s = s.next(SourceEvent::FeedLoaded { items: 2 }).unwrap();
        assert_eq!(s, SourceState::ItemProcessing { index: 0, total: 2 });
        s = s.next(SourceEvent::ItemResolved).unwrap();
        assert_eq!(s, SourceState::ItemProcessing { index: 1, total: 2 });
        s = s.next(SourceEvent::ItemResolved).unwrap();
        assert_eq!(s, SourceState::Aggregating);
        s = s.next(SourceEvent::AggregationFinished).unwrap();
        assert_eq!(s, SourceState::Done);
        assert!(s.is_terminal());
    }

    #[test]
    fn empty_feed_goes_straight_to_aggregation() {
        let s = SourceState::FeedFetching
            .next(SourceEvent::FeedLoaded { items: 0 })
            .unwrap();
        assert_eq!(s, SourceState::Aggregating);
    }

    #[test]
    fn source_failure_only_from_feed_fetching() {
        assert_eq!(
            SourceState::FeedFetching.next(SourceEvent::FeedFailed),
            Some(SourceState::SourceFailed)
        );
        assert_eq!(
            SourceState::ItemProcessing { index: 0, total: 3 }.next(SourceEvent::FeedFailed),
            None
        );
        assert_eq!(SourceState::Aggregating.next(SourceEvent::FeedFailed), None);
        assert_eq!(SourceState::SourceFailed.next(SourceEvent::Start), None);
    }

    #[test]
    fn existing_post_is_reused_not_rescraped() {
        assert_eq!(dedup_decision(None), DedupDecision::Scrape);
        let item = FeedItem {
            title: "t".into(),
            link: "https://x/1?a=b".into(),
            published_at: parse_instant("2025-06-10 10:00:00").unwrap(),
        };
        let v = Validation {
            char_count_no_spaces: 1200,
            image_count: 4,
            is_valid: true,
        };
        let post = build_post("c", "c_x".into(), 1, &item, "https://x/1".into(), &v, item.published_at);
        assert_eq!(post.url, "https://x/1");
        assert_eq!(post.word_count, 1200);
        assert!(post.feedback.is_none());
        assert!(matches!(dedup_decision(Some(post)), DedupDecision::ReuseExisting(_)));
    }
}
