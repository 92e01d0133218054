// src/telemetry.rs
//! Pipeline telemetry. The job has no HTTP listener, so the Prometheus
//! rendering is written to a textfile at the end of a run for the node
//! exporter's textfile collector to pick up.

use std::path::Path;

use anyhow::{Context, Result};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series carry descriptions).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("pipeline_sources_total", "Sources picked up by a run.");
        describe_counter!(
            "pipeline_source_failures_total",
            "Sources skipped because their feed was missing, unreachable or malformed."
        );
        describe_counter!(
            "pipeline_items_outside_window_total",
            "Feed items published outside the challenge window."
        );
        describe_counter!(
            "pipeline_items_reused_total",
            "In-window items already stored by an earlier run."
        );
        describe_counter!("pipeline_posts_created_total", "Posts scraped and stored.");
        describe_counter!(
            "pipeline_posts_valid_total",
            "Newly stored posts that passed the recognition rule."
        );
        describe_counter!(
            "pipeline_item_failures_total",
            "Items skipped after a scrape or store failure."
        );
        describe_histogram!("pipeline_scrape_ms", "Render + extract time per post in milliseconds.");
        describe_histogram!("feed_parse_ms", "Feed parse time in milliseconds.");
        describe_gauge!("pipeline_last_run_ts", "Unix ts when the pipeline last finished.");
    });
}

/// Install the process-wide recorder. Call once, early in `main`.
pub fn install_recorder() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("installing prometheus recorder")?;
    ensure_metrics_described();
    Ok(handle)
}

/// Write the current exposition atomically (temp file + rename).
pub fn write_textfile(handle: &PrometheusHandle, path: &Path) -> Result<()> {
    let tmp = path.with_extension("prom.tmp");
    std::fs::write(&tmp, handle.render())
        .with_context(|| format!("writing metrics to {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("moving metrics into {}", path.display()))?;
    Ok(())
}
