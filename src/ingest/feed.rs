// src/ingest/feed.rs
//! RSS 2.0 / Atom reader.
//!
//! The raw document is deserialized into dialect-specific structs, then
//! every entry goes through one normalization step into [`FeedItem`].
//! Entries without a link or a parseable timestamp reject the whole feed.

use std::time::{Duration, Instant};

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::histogram;
use quick_xml::de::from_str;
use quick_xml::events::Event;
use serde::Deserialize;
use time::format_description::well_known::{Rfc2822, Rfc3339};
use time::OffsetDateTime;

use super::types::{FeedFormat, FeedItem, FeedLink, FeedReader, FeedText, LinkRel};
use crate::error::FeedError;

// ---- RSS 2.0 ----

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    #[serde(rename = "dc:date")]
    dc_date: Option<String>,
}

// ---- Atom ----

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<AtomText>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
    published: Option<String>,
    updated: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomText {
    #[serde(rename = "@type")]
    kind: Option<String>,
    #[serde(rename = "$text", default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@rel")]
    rel: Option<String>,
    #[serde(rename = "@href")]
    href: Option<String>,
}

/// Dialect-neutral entry before validation.
#[derive(Debug)]
struct RawEntry {
    title: Option<FeedText>,
    link: Option<FeedLink>,
    published: Option<String>,
}

impl From<RssItem> for RawEntry {
    fn from(it: RssItem) -> Self {
        RawEntry {
            title: it.title.map(FeedText::Plain),
            link: it.link.map(FeedLink::DirectUrl),
            published: it.pub_date.or(it.dc_date),
        }
    }
}

impl From<AtomEntry> for RawEntry {
    fn from(e: AtomEntry) -> Self {
        let link = if e.links.is_empty() {
            None
        } else {
            Some(FeedLink::AlternateLinks(
                e.links
                    .into_iter()
                    .map(|l| LinkRel {
                        rel: l.rel,
                        href: l.href,
                    })
                    .collect(),
            ))
        };
        RawEntry {
            title: e.title.map(|t| FeedText::Typed {
                kind: t.kind,
                value: t.value,
            }),
            link,
            published: e.published.or(e.updated),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFeed {
    pub format: FeedFormat,
    pub items: Vec<FeedItem>,
}

/// Root element decides the dialect.
fn detect_format(xml: &str) -> Option<FeedFormat> {
    let mut reader = quick_xml::Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return match e.local_name().as_ref() {
                    b"rss" => Some(FeedFormat::Rss),
                    b"feed" => Some(FeedFormat::Atom),
                    _ => None,
                };
            }
            Ok(Event::Eof) | Err(_) => return None,
            Ok(_) => continue,
        }
    }
}

/// Parse RFC 2822 (RSS) or RFC 3339 (Atom, dc:date) timestamps.
pub fn parse_feed_date(ts: &str) -> Option<DateTime<Utc>> {
    let ts = ts.trim();
    let strict = OffsetDateTime::parse(ts, &Rfc2822)
        .or_else(|_| OffsetDateTime::parse(ts, &Rfc3339))
        .ok()
        .and_then(|dt| DateTime::<Utc>::from_timestamp(dt.unix_timestamp(), dt.nanosecond()));
    // chrono is more forgiving with obsolete zone names ("GMT", "KST"-less forms)
    strict.or_else(|| {
        DateTime::parse_from_rfc2822(ts)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    })
}

/// Parse a feed body. `url` is only used for error context.
pub fn parse_feed(url: &str, body: &str) -> Result<ParsedFeed, FeedError> {
    let t0 = Instant::now();
    let xml = scrub_html_entities_for_xml(body);

    let format = detect_format(&xml)
        .ok_or_else(|| FeedError::unparseable(url, "document root is neither <rss> nor <feed>"))?;

    let raw: Vec<RawEntry> = match format {
        FeedFormat::Rss => {
            let rss: Rss = from_str(&xml)
                .context("parsing rss xml")
                .map_err(|e| FeedError::unparseable(url, format!("{e:#}")))?;
            rss.channel.items.into_iter().map(RawEntry::from).collect()
        }
        FeedFormat::Atom => {
            let atom: AtomFeed = from_str(&xml)
                .context("parsing atom xml")
                .map_err(|e| FeedError::unparseable(url, format!("{e:#}")))?;
            atom.entries.into_iter().map(RawEntry::from).collect()
        }
    };

    let mut items = Vec::with_capacity(raw.len());
    for (idx, entry) in raw.into_iter().enumerate() {
        items.push(normalize_entry(url, idx, entry)?);
    }

    histogram!("feed_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    Ok(ParsedFeed { format, items })
}

fn normalize_entry(url: &str, idx: usize, entry: RawEntry) -> Result<FeedItem, FeedError> {
    let link = entry
        .link
        .as_ref()
        .and_then(FeedLink::resolve)
        .ok_or_else(|| FeedError::unparseable(url, format!("entry #{} has no link", idx + 1)))?;
    let published_at = entry
        .published
        .as_deref()
        .and_then(parse_feed_date)
        .ok_or_else(|| {
            FeedError::unparseable(
                url,
                format!(
                    "entry #{} has no parseable timestamp ({:?})",
                    idx + 1,
                    entry.published
                ),
            )
        })?;
    let title = entry
        .title
        .as_ref()
        .map(FeedText::resolve)
        .unwrap_or_else(|| super::UNTITLED.to_string());

    Ok(FeedItem {
        title,
        link,
        published_at,
    })
}

/// HTML entities that blog platforms leak into feeds but XML does not define.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
        .replace("&middot;", "·")
        .replace("&hellip;", "...")
}

/// Fetches feeds over HTTP with a bounded timeout.
pub struct HttpFeedReader {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpFeedReader {
    pub fn new(timeout: Duration, user_agent: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .context("building feed http client")?;
        Ok(Self { client, timeout })
    }

    pub async fn fetch_body(&self, feed_url: &str) -> Result<String, FeedError> {
        let resp = self.client.get(feed_url).send().await.map_err(|e| {
            if e.is_timeout() {
                FeedError::unavailable(
                    feed_url,
                    format!("timed out after {}s", self.timeout.as_secs()),
                )
            } else {
                FeedError::unavailable(feed_url, e.to_string())
            }
        })?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FeedError::unavailable(feed_url, format!("http status {status}")));
        }
        resp.text()
            .await
            .map_err(|e| FeedError::unavailable(feed_url, format!("reading body: {e}")))
    }
}

#[async_trait]
impl FeedReader for HttpFeedReader {
    async fn fetch_feed(&self, feed_url: &str) -> Result<Vec<FeedItem>, FeedError> {
        let body = self.fetch_body(feed_url).await?;
        Ok(parse_feed(feed_url, &body)?.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Campus blog</title>
    <link>https://blog.naver.com/eie_test</link>
    <item>
      <title><![CDATA[Week 1 &nbsp;recap]]></title>
      <link>https://blog.naver.com/eie_test/223001?fromRss=true&amp;trackingCode=rss</link>
      <category>daily</category>
      <pubDate>Tue, 10 Jun 2025 21:30:00 +0900</pubDate>
    </item>
    <item>
      <title>Second</title>
      <link>https://blog.naver.com/eie_test/223002</link>
      <pubDate>Wed, 11 Jun 2025 09:00:00 GMT</pubDate>
    </item>
  </channel>
</rss>"#;

    const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Campus</title>
  <link rel="self" href="https://campus.example/feed"/>
  <entry>
    <title type="html">Tom &amp;amp; Jerry</title>
    <link rel="self" href="https://campus.example/api/1"/>
    <link rel="alternate" href="https://campus.example/posts/1"/>
    <updated>2025-06-12T03:00:00Z</updated>
  </entry>
  <entry>
    <title>Plain</title>
    <link href="https://campus.example/posts/2"/>
    <published>2025-06-13T10:00:00+09:00</published>
    <updated>2025-06-20T10:00:00+09:00</updated>
  </entry>
</feed>"#;

    #[test]
    fn rss_items_are_normalized() {
        let parsed = parse_feed("u", RSS).unwrap();
        assert_eq!(parsed.format, FeedFormat::Rss);
        assert_eq!(parsed.items.len(), 2);
        let first = &parsed.items[0];
        assert_eq!(first.title, "Week 1 recap");
        assert_eq!(
            first.link,
            "https://blog.naver.com/eie_test/223001?fromRss=true&trackingCode=rss"
        );
        assert_eq!(first.published_at.to_rfc3339(), "2025-06-10T12:30:00+00:00");
        assert_eq!(
            parsed.items[1].published_at.to_rfc3339(),
            "2025-06-11T09:00:00+00:00"
        );
    }

    #[test]
    fn atom_entries_prefer_alternate_and_published() {
        let parsed = parse_feed("u", ATOM).unwrap();
        assert_eq!(parsed.format, FeedFormat::Atom);
        assert_eq!(parsed.items[0].link, "https://campus.example/posts/1");
        assert_eq!(parsed.items[0].title, "Tom & Jerry");
        assert_eq!(parsed.items[1].link, "https://campus.example/posts/2");
        assert_eq!(
            parsed.items[1].published_at.to_rfc3339(),
            "2025-06-13T01:00:00+00:00"
        );
    }

    #[test]
    fn empty_channel_is_not_an_error() {
        let xml = r#"<rss version="2.0"><channel><title>x</title></channel></rss>"#;
        assert!(parse_feed("u", xml).unwrap().items.is_empty());
    }

    #[test]
    fn non_feed_documents_are_rejected() {
        let err = parse_feed("u", "<html><body>hi</body></html>").unwrap_err();
        assert!(matches!(err, FeedError::Unparseable { .. }));
        assert!(parse_feed("u", "not xml at all").is_err());
    }

    #[test]
    fn entry_without_date_rejects_feed() {
        let xml = r#"<rss version="2.0"><channel>
            <item><title>a</title><link>https://x/1</link></item>
        </channel></rss>"#;
        let err = parse_feed("u", xml).unwrap_err();
        assert!(err.to_string().contains("timestamp"));
    }

    // WordPress puts the reply links after <content>, apart from the alternate.
    const WORDPRESS_ATOM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:thr="http://purl.org/syndication/thread/1.0">
  <title type="text">Campus</title>
  <link rel="alternate" type="text/html" href="https://campus.example"/>
  <id>https://campus.example/feed/atom/</id>
  <updated>2025-06-14T02:00:00Z</updated>
  <entry>
    <author><name>admin</name></author>
    <title type="html"><![CDATA[Field trip]]></title>
    <link rel="alternate" type="text/html" href="https://campus.example/2025/06/field-trip/"/>
    <id>https://campus.example/?p=101</id>
    <updated>2025-06-14T02:00:00Z</updated>
    <published>2025-06-14T01:00:00Z</published>
    <category scheme="https://campus.example" term="camp"/>
    <summary type="html"><![CDATA[We went outside]]></summary>
    <content type="html" xml:base="https://campus.example/2025/06/field-trip/"><![CDATA[<p>long post</p>]]></content>
    <link rel="replies" type="text/html" href="https://campus.example/2025/06/field-trip/#comments" thr:count="2"/>
    <link rel="replies" type="application/atom+xml" href="https://campus.example/2025/06/field-trip/feed/atom/" thr:count="2"/>
    <thr:total>2</thr:total>
  </entry>
  <entry>
    <title type="html"><![CDATA[Day two]]></title>
    <link rel="alternate" type="text/html" href="https://campus.example/2025/06/day-two/"/>
    <id>https://campus.example/?p=102</id>
    <published>2025-06-15T01:00:00Z</published>
    <content type="html"><![CDATA[<p>more</p>]]></content>
    <link rel="replies" type="text/html" href="https://campus.example/2025/06/day-two/#comments"/>
  </entry>
</feed>"#;

    #[test]
    fn wordpress_atom_with_split_links_parses() {
        let parsed = parse_feed("u", WORDPRESS_ATOM).unwrap();
        assert_eq!(parsed.format, FeedFormat::Atom);
        assert_eq!(parsed.items.len(), 2);
        assert_eq!(parsed.items[0].link, "https://campus.example/2025/06/field-trip/");
        assert_eq!(parsed.items[0].title, "Field trip");
        assert_eq!(
            parsed.items[1].published_at.to_rfc3339(),
            "2025-06-15T01:00:00+00:00"
        );
    }

    #[test]
    fn rss_items_separated_by_other_elements_parse() {
        let xml = r#"<rss version="2.0" xmlns:atom="http://www.w3.org/2005/Atom"><channel>
            <title>x</title>
            <item><title>a</title><link>https://x/1</link><pubDate>Tue, 10 Jun 2025 12:00:00 GMT</pubDate></item>
            <atom:link rel="self" href="https://x/feed"/>
            <item><title>b</title><link>https://x/2</link><pubDate>Wed, 11 Jun 2025 12:00:00 GMT</pubDate></item>
        </channel></rss>"#;
        let parsed = parse_feed("u", xml).unwrap();
        let links: Vec<&str> = parsed.items.iter().map(|i| i.link.as_str()).collect();
        assert_eq!(links, vec!["https://x/1", "https://x/2"]);
    }
}
