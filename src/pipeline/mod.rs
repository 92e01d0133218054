// src/pipeline/mod.rs
//! # Ingestion pipeline
//! One run: launch the renderer, walk every active source's feed, reuse or
//! scrape each in-window item, then recompute the source's aggregates.
//!
//! Sources and items are processed strictly in order, one page at a time.
//! Only a renderer launch failure or an unreadable source list aborts the
//! run; everything else is logged and skipped.

pub mod state;

use chrono::{DateTime, Utc};
use metrics::{counter, gauge};
use serde::Serialize;
use tracing::{debug, error, info, warn};

pub use state::{
    build_post, dedup_decision, window_check, DedupDecision, FailedStage, ItemOutcome,
    SourceEvent, SourceState, WindowVerdict,
};

use crate::aggregate::{self, Aggregates};
use crate::error::{FeedError, PipelineError, ScrapeError};
use crate::identity::{canonicalize, derive_id};
use crate::ingest::{derive_feed_url, FeedItem, FeedReader};
use crate::model::{RunState, RunStatus, Source};
use crate::recognition::RecognitionCriteria;
use crate::scrape::{BrowserLauncher, BrowserSession, ContentScraper, ScrapedContent};
use crate::store::Repository;
use crate::telemetry::ensure_metrics_described;
use crate::timezone::ChallengeWindow;
use crate::validator::validate;

/// What happened to one source during a run.
#[derive(Debug, Clone, Serialize)]
pub struct SourceReport {
    pub source_id: String,
    pub name: String,
    pub final_state: SourceState,
    pub outcomes: Vec<ItemOutcome>,
    pub aggregates: Option<Aggregates>,
    /// Set when the source failed or its aggregates could not be written.
    pub error: Option<String>,
}

impl SourceReport {
    fn new(source: &Source) -> Self {
        Self {
            source_id: source.id.clone(),
            name: source.display_name().to_string(),
            final_state: SourceState::Idle,
            outcomes: Vec::new(),
            aggregates: None,
            error: None,
        }
    }

    pub fn failed(&self) -> bool {
        self.final_state == SourceState::SourceFailed
    }

    pub fn created(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Created { .. }))
    }

    pub fn reused(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Reused { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Skipped { .. }))
    }

    pub fn outside_window(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::OutsideWindow))
    }

    fn count(&self, pred: impl Fn(&ItemOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(o)).count()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub sources: Vec<SourceReport>,
}

impl RunSummary {
    pub fn posts_created(&self) -> usize {
        self.sources.iter().map(SourceReport::created).sum()
    }

    pub fn posts_reused(&self) -> usize {
        self.sources.iter().map(SourceReport::reused).sum()
    }

    pub fn items_skipped(&self) -> usize {
        self.sources.iter().map(SourceReport::skipped).sum()
    }

    pub fn sources_failed(&self) -> usize {
        self.sources.iter().filter(|s| s.failed()).count()
    }

    pub fn describe(&self) -> String {
        format!(
            "{} sources ({} failed), {} posts created, {} reused, {} items skipped",
            self.sources.len(),
            self.sources_failed(),
            self.posts_created(),
            self.posts_reused(),
            self.items_skipped()
        )
    }
}

pub struct Pipeline<'a> {
    repo: Repository<'a>,
    feeds: &'a dyn FeedReader,
    scraper: &'a ContentScraper,
    criteria: RecognitionCriteria,
    window: ChallengeWindow,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        repo: Repository<'a>,
        feeds: &'a dyn FeedReader,
        scraper: &'a ContentScraper,
        criteria: RecognitionCriteria,
        window: ChallengeWindow,
    ) -> Self {
        Self {
            repo,
            feeds,
            scraper,
            criteria,
            window,
        }
    }

    /// Full run. The session is closed on every path after a successful
    /// launch.
    pub async fn run(&self, launcher: &dyn BrowserLauncher) -> Result<RunSummary, PipelineError> {
        ensure_metrics_described();
        let session = match launcher.launch().await {
            Ok(s) => s,
            Err(e) => {
                error!(error = %e, "renderer launch failed; aborting run");
                self.write_status(RunState::Error, 0, &e.to_string()).await;
                return Err(e.into());
            }
        };

        let result = self.run_with_session(session.as_ref()).await;
        session.close().await;
        result
    }

    /// Run against an already launched session. The caller owns closing it.
    pub async fn run_with_session(
        &self,
        session: &dyn BrowserSession,
    ) -> Result<RunSummary, PipelineError> {
        let started_at = Utc::now();
        info!(window = %self.window.describe(), "pipeline run started");
        self.write_status(RunState::Running, 0, "run started").await;

        let sources = match self.repo.active_sources().await {
            Ok(s) => s,
            Err(e) => {
                error!(error = %e, "could not list active sources; aborting run");
                self.write_status(RunState::Error, 0, &e.to_string()).await;
                return Err(e.into());
            }
        };
        if sources.is_empty() {
            info!("no active sources");
        }

        let mut reports = Vec::with_capacity(sources.len());
        for source in &sources {
            reports.push(self.process_source(session, source).await);
        }

        let summary = RunSummary {
            started_at,
            finished_at: Utc::now(),
            sources: reports,
        };
        let processed = u32::try_from(summary.posts_created()).unwrap_or(u32::MAX);
        self.write_status(RunState::Completed, processed, &summary.describe())
            .await;
        gauge!("pipeline_last_run_ts").set(summary.finished_at.timestamp() as f64);
        info!(summary = %summary.describe(), "pipeline run finished");
        Ok(summary)
    }

    /// Drive one source from `Idle` to `Done` or `SourceFailed`.
    pub async fn process_source(&self, session: &dyn BrowserSession, source: &Source) -> SourceReport {
        let mut report = SourceReport::new(source);
        let mut state = advance(SourceState::Idle, SourceEvent::Start, &source.id);
        counter!("pipeline_sources_total").increment(1);
        info!(source_id = %source.id, name = %source.display_name(), "processing source");

        let fetched = match self.feed_url_for(source) {
            Ok(url) => self.feeds.fetch_feed(&url).await,
            Err(e) => Err(e),
        };
        let items = match fetched {
            Ok(items) => items,
            Err(e) => {
                warn!(source_id = %source.id, error = %e, "feed unusable; skipping source");
                counter!("pipeline_source_failures_total").increment(1);
                report.final_state = advance(state, SourceEvent::FeedFailed, &source.id);
                report.error = Some(e.to_string());
                return report;
            }
        };
        debug!(source_id = %source.id, items = items.len(), "feed loaded");
        state = advance(state, SourceEvent::FeedLoaded { items: items.len() }, &source.id);

        let mut number = 0u32;
        for item in &items {
            let outcome = self.process_item(session, source, item, &mut number).await;
            report.outcomes.push(outcome);
            state = advance(state, SourceEvent::ItemResolved, &source.id);
        }

        match aggregate::recompute(&self.repo, &source.id, &self.window).await {
            Ok(agg) => {
                info!(
                    source_id = %source.id,
                    total_posts = agg.total_posts,
                    valid_posts = agg.valid_posts,
                    "aggregates updated"
                );
                report.aggregates = Some(agg);
            }
            Err(e) => {
                error!(source_id = %source.id, error = %e, "aggregate recompute failed");
                report.error = Some(e.to_string());
            }
        }
        report.final_state = advance(state, SourceEvent::AggregationFinished, &source.id);
        report
    }

    fn feed_url_for(&self, source: &Source) -> Result<String, FeedError> {
        source
            .feed_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(String::from)
            .or_else(|| derive_feed_url(&source.url))
            .ok_or_else(|| FeedError::NoFeedUrl {
                site_url: source.url.clone(),
            })
    }

    /// Resolve one item. `number` is the in-window ordinal; it advances for
    /// every in-window item, reused or not.
    async fn process_item(
        &self,
        session: &dyn BrowserSession,
        source: &Source,
        item: &FeedItem,
        number: &mut u32,
    ) -> ItemOutcome {
        if window_check(&self.window, item) == WindowVerdict::OutsideWindow {
            debug!(source_id = %source.id, url = %item.link, "outside challenge window");
            counter!("pipeline_items_outside_window_total").increment(1);
            return ItemOutcome::OutsideWindow;
        }
        *number += 1;

        let canonical = canonicalize(&item.link);
        let post_id = derive_id(&source.id, &canonical);

        let existing = match self.repo.find_post(&post_id).await {
            Ok(p) => p,
            Err(e) => {
                return skip(source, item, FailedStage::DedupLookup, e.to_string());
            }
        };
        if let DedupDecision::ReuseExisting(post) = dedup_decision(existing) {
            debug!(source_id = %source.id, post_id = %post_id, "already stored; reusing");
            counter!("pipeline_items_reused_total").increment(1);
            return ItemOutcome::Reused {
                post_id,
                is_valid: post.is_valid,
            };
        }

        let content = match self.scrape_item(session, &item.link).await {
            Ok(c) => c,
            Err(e) => {
                return skip(source, item, FailedStage::Scrape, format!("{}: {e}", e.kind()));
            }
        };

        let validation = validate(&content, &self.criteria);
        let post = build_post(
            &source.id,
            post_id,
            *number,
            item,
            canonical,
            &validation,
            Utc::now(),
        );
        if let Err(e) = self.repo.create_post(&post).await {
            return skip(source, item, FailedStage::Persist, e.to_string());
        }

        counter!("pipeline_posts_created_total").increment(1);
        if post.is_valid {
            counter!("pipeline_posts_valid_total").increment(1);
        }
        info!(
            source_id = %source.id,
            title = %post.title,
            chars = post.word_count,
            images = post.image_count,
            valid = post.is_valid,
            "post stored"
        );
        ItemOutcome::Created {
            post_id: post.id,
            is_valid: post.is_valid,
        }
    }

    async fn scrape_item(
        &self,
        session: &dyn BrowserSession,
        url: &str,
    ) -> Result<ScrapedContent, ScrapeError> {
        let page = session.new_page().await?;
        self.scraper.scrape(page.as_ref(), url).await
    }

    /// Status writes are best effort; a failure is logged and the run goes on.
    async fn write_status(&self, status: RunState, total_processed: u32, message: &str) {
        let doc = RunStatus {
            status,
            last_updated: Utc::now(),
            total_processed,
            message: message.to_string(),
        };
        if let Err(e) = self.repo.write_run_status(&doc).await {
            warn!(error = %e, "could not write run status");
        }
    }
}

fn advance(state: SourceState, event: SourceEvent, source_id: &str) -> SourceState {
    match state.next(event) {
        Some(next) => next,
        None => {
            warn!(source_id, ?state, ?event, "ignoring invalid source transition");
            state
        }
    }
}

fn skip(source: &Source, item: &FeedItem, stage: FailedStage, reason: String) -> ItemOutcome {
    warn!(
        source_id = %source.id,
        url = %item.link,
        title = %item.title,
        ?stage,
        reason = %reason,
        "item skipped"
    );
    counter!("pipeline_item_failures_total").increment(1);
    ItemOutcome::Skipped { stage, reason }
}
