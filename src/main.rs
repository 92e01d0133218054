//! Blog Challenge Ingest: binary entrypoint
//! One pipeline run: load config, render and measure every new in-window
//! post of every active source, then print the standings.
//!
//! Exit status is non-zero only when the run itself could not proceed
//! (bad configuration, renderer unavailable, source list unreadable).

use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use blog_challenge_ingest::config::{load_profile_default, RunConfig};
use blog_challenge_ingest::ingest::HttpFeedReader;
use blog_challenge_ingest::leaderboard::rank_sources;
use blog_challenge_ingest::scrape::ContentScraper;
use blog_challenge_ingest::store::{JsonFileStore, Repository};
use blog_challenge_ingest::timezone::format_local;
use blog_challenge_ingest::{telemetry, Pipeline};

/// Compact logs by default; `LOG_FORMAT=json` for machine-readable output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("blog_challenge_ingest=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .ok()
        .is_some_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env in local/dev; no-op when the file is absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = ?e, "run failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let metrics = telemetry::install_recorder()?;

    let cfg = RunConfig::from_env()?;
    info!(config = %cfg.describe(), "configuration loaded");

    let profile = load_profile_default()?;
    let scraper = ContentScraper::new(&profile)?;
    let feeds = HttpFeedReader::new(cfg.feed_timeout, &cfg.user_agent)?;
    let store = JsonFileStore::open(&cfg.store_dir)
        .await
        .with_context(|| format!("opening store at {}", cfg.store_dir.display()))?;
    let repo = Repository::new(&store);

    let pipeline = Pipeline::new(repo, &feeds, &scraper, cfg.criteria, cfg.window);
    let outcome = pipeline.run(&cfg.browser).await;

    if let Some(path) = &cfg.metrics_textfile {
        if let Err(e) = telemetry::write_textfile(&metrics, path) {
            warn!(error = ?e, "metrics textfile not written");
        }
    }

    let summary = outcome?;
    for r in summary.sources.iter().filter(|r| r.error.is_some()) {
        warn!(
            source_id = %r.source_id,
            error = r.error.as_deref().unwrap_or_default(),
            "source finished with an error"
        );
    }

    match repo.active_sources().await {
        Ok(sources) => {
            for row in rank_sources(&sources) {
                info!(
                    rank = row.rank,
                    name = %row.name,
                    valid_posts = row.valid_posts,
                    total_posts = row.total_posts,
                    last_post = %row.last_post_date.map(format_local).unwrap_or_else(|| "-".into()),
                    "leaderboard"
                );
            }
        }
        Err(e) => warn!(error = %e, "leaderboard unavailable"),
    }
    Ok(())
}
