//! Probe a feed URL before wiring a campus up; prints the verdict as JSON.
//!
//! Usage: `validate_feed <feed-url>` (or a blog home URL, whose Naver feed
//! address is derived when possible).

use std::process::ExitCode;

use blog_challenge_ingest::config::run::DEFAULT_USER_AGENT;
use blog_challenge_ingest::ingest::{derive_feed_url, validate_feed};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt().with_target(false).init();

    let Some(arg) = std::env::args().nth(1) else {
        eprintln!("usage: validate_feed <feed-url>");
        return ExitCode::from(2);
    };
    let url = derive_feed_url(&arg).unwrap_or(arg);

    let client = match reqwest::Client::builder()
        .user_agent(DEFAULT_USER_AGENT)
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            eprintln!("http client: {e}");
            return ExitCode::FAILURE;
        }
    };

    let verdict = validate_feed(&client, &url).await;
    match serde_json::to_string_pretty(&verdict) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("{e}"),
    }
    if verdict.valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
