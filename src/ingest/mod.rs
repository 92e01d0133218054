// src/ingest/mod.rs
pub mod feed;
pub mod types;
pub mod validate;

use once_cell::sync::OnceCell;
use regex::Regex;
use url::Url;

pub use feed::{parse_feed, HttpFeedReader, ParsedFeed};
pub use types::{FeedFormat, FeedItem, FeedLink, FeedReader, FeedText, LinkRel};
pub use validate::{validate_feed, FeedValidation};

pub const UNTITLED: &str = "(untitled)";

/// Collapse runs of whitespace and trim.
pub fn collapse_ws(s: &str) -> String {
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").expect("static regex"));
    re_ws.replace_all(s, " ").trim().to_string()
}

/// Normalize a feed title: decode HTML entities, strip tags, collapse
/// whitespace. Empty titles become [`UNTITLED`].
pub fn normalize_title(s: &str) -> String {
    // 1) HTML entity decode
    let decoded = html_escape::decode_html_entities(s);

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").expect("static regex"));
    let stripped = re_tags.replace_all(&decoded, "");

    // 3) Collapse whitespace
    let out = collapse_ws(&stripped);
    if out.is_empty() {
        UNTITLED.to_string()
    } else {
        out
    }
}

pub fn is_http_url(s: &str) -> bool {
    Url::parse(s.trim())
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Feed URL for blog hosts whose feed location follows from the site URL.
///
/// Only Naver blogs qualify: `blog.naver.com/<id>` and
/// `m.blog.naver.com/<id>` map to `https://rss.blog.naver.com/<id>.xml`.
pub fn derive_feed_url(site_url: &str) -> Option<String> {
    let u = Url::parse(site_url.trim()).ok()?;
    match u.host_str()? {
        "blog.naver.com" | "m.blog.naver.com" => {}
        _ => return None,
    }
    let blog_id = u
        .query_pairs()
        .find(|(k, _)| k == "blogId")
        .map(|(_, v)| v.into_owned())
        .or_else(|| {
            u.path_segments()?
                .find(|seg| !seg.is_empty())
                .map(str::to_string)
        })?;
    // `PostList.naver` and friends are pages, not blog ids.
    if blog_id.contains('.') {
        return None;
    }
    Some(format!("https://rss.blog.naver.com/{blog_id}.xml"))
}
