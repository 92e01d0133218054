// src/ingest/validate.rs
//! Quick reachability/format probe for a feed URL, used before a campus is
//! wired up. Never fails; the verdict and a human-readable message are
//! returned instead.

use std::time::Duration;

use serde::Serialize;

use super::feed::parse_feed;
use super::types::FeedFormat;

pub const VALIDATE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedValidation {
    pub valid: bool,
    pub message: String,
    pub format: Option<FeedFormat>,
    pub item_count: Option<usize>,
}

impl FeedValidation {
    fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: message.into(),
            format: None,
            item_count: None,
        }
    }
}

/// Content checks on an already-fetched response.
pub fn check_feed_response(url: &str, content_type: Option<&str>, body: &str) -> FeedValidation {
    let ct = content_type.unwrap_or_default().to_ascii_lowercase();
    if !(ct.contains("xml") || ct.contains("rss") || ct.contains("atom")) {
        return FeedValidation::invalid(format!("not an XML content type: {ct:?}"));
    }
    if !(body.contains("<rss") || body.contains("<feed")) {
        return FeedValidation::invalid("body is not an RSS or Atom document");
    }
    match parse_feed(url, body) {
        Ok(parsed) => FeedValidation {
            valid: true,
            message: format!("valid feed with {} item(s)", parsed.items.len()),
            format: Some(parsed.format),
            item_count: Some(parsed.items.len()),
        },
        Err(e) => FeedValidation::invalid(e.to_string()),
    }
}

pub async fn validate_feed(client: &reqwest::Client, url: &str) -> FeedValidation {
    if url.trim().is_empty() {
        return FeedValidation::invalid("feed url is required");
    }
    if !super::is_http_url(url) {
        return FeedValidation::invalid("feed url must be an http(s) url");
    }

    let resp = match client.get(url.trim()).timeout(VALIDATE_TIMEOUT).send().await {
        Ok(r) => r,
        Err(e) => {
            tracing::debug!(error = %e, url, "feed validation fetch failed");
            return FeedValidation::invalid(format!("fetch failed: {e}"));
        }
    };
    let status = resp.status();
    if !status.is_success() {
        return FeedValidation::invalid(format!("feed returned http status {status}"));
    }
    let content_type = resp
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    match resp.text().await {
        Ok(body) => check_feed_response(url, content_type.as_deref(), &body),
        Err(e) => FeedValidation::invalid(format!("reading body failed: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINI_RSS: &str = r#"<rss version="2.0"><channel>
        <item><title>a</title><link>https://x/1</link><pubDate>Tue, 10 Jun 2025 21:30:00 +0900</pubDate></item>
    </channel></rss>"#;

    #[test]
    fn content_type_must_look_like_xml() {
        let v = check_feed_response("u", Some("text/html; charset=utf-8"), MINI_RSS);
        assert!(!v.valid);
        assert!(v.message.contains("content type"));
    }

    #[test]
    fn valid_feed_reports_format_and_count() {
        let v = check_feed_response("u", Some("application/rss+xml"), MINI_RSS);
        assert!(v.valid, "{}", v.message);
        assert_eq!(v.format, Some(FeedFormat::Rss));
        assert_eq!(v.item_count, Some(1));
    }

    #[test]
    fn html_body_is_rejected() {
        let v = check_feed_response("u", Some("text/xml"), "<html></html>");
        assert!(!v.valid);
    }

    #[tokio::test]
    async fn malformed_urls_fail_before_fetching() {
        let client = reqwest::Client::new();
        assert!(!validate_feed(&client, "").await.valid);
        assert!(!validate_feed(&client, "rss.blog.naver.com/x.xml").await.valid);
    }
}
