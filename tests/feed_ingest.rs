// tests/feed_ingest.rs
use blog_challenge_ingest::identity::{canonical_url_from_id, post_id_for_link};
use blog_challenge_ingest::ingest::validate::check_feed_response;
use blog_challenge_ingest::ingest::{derive_feed_url, parse_feed, FeedFormat};
use blog_challenge_ingest::timezone::parse_instant;
use blog_challenge_ingest::ChallengeWindow;

// Shape of a real rss.blog.naver.com feed: CDATA titles, HTML entities that
// XML does not define, and +0900 pubDates.
const NAVER_RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:dc="http://purl.org/dc/elements/1.1/">
  <channel>
    <title><![CDATA[EiE 강남캠퍼스 : 네이버 블로그]]></title>
    <link>https://blog.naver.com/eie</link>
    <description><![CDATA[영어 캠프&nbsp;소식]]></description>
    <item>
      <author>eie</author>
      <category><![CDATA[캠프]]></category>
      <title><![CDATA[<b>여름 캠프</b> &ldquo;1주차&rdquo; 후기]]></title>
      <link><![CDATA[https://blog.naver.com/eie/223900001?fromRss=true&trackingCode=rss]]></link>
      <guid>https://blog.naver.com/eie/223900001</guid>
      <description><![CDATA[본문&nbsp;미리보기]]></description>
      <pubDate>Mon, 09 Jun 2025 00:00:00 +0900</pubDate>
    </item>
    <item>
      <title><![CDATA[봄 학기 마무리]]></title>
      <link><![CDATA[https://blog.naver.com/eie/223800001?fromRss=true&trackingCode=rss]]></link>
      <pubDate>Sun, 08 Jun 2025 23:59:59 +0900</pubDate>
    </item>
  </channel>
</rss>"#;

fn summer() -> ChallengeWindow {
    ChallengeWindow::new(
        parse_instant("2025-06-09 00:00:00").unwrap(),
        parse_instant("2025-07-08 23:59:59").unwrap(),
    )
    .unwrap()
}

#[test]
fn naver_feed_parses_and_window_edges_hold() {
    let parsed = parse_feed("https://rss.blog.naver.com/eie.xml", NAVER_RSS).unwrap();
    assert_eq!(parsed.format, FeedFormat::Rss);
    assert_eq!(parsed.items.len(), 2);

    let first = &parsed.items[0];
    assert_eq!(first.title, "여름 캠프 \"1주차\" 후기");
    assert!(summer().contains(first.published_at));
    assert!(!summer().contains(parsed.items[1].published_at));
}

#[test]
fn ids_ignore_tracking_parameters() {
    let parsed = parse_feed("u", NAVER_RSS).unwrap();
    let link = &parsed.items[0].link;
    let id = post_id_for_link("eie", link);
    assert_eq!(id, post_id_for_link("eie", "https://blog.naver.com/eie/223900001"));
    assert_eq!(
        id,
        post_id_for_link("eie", "https://blog.naver.com/eie/223900001#comments")
    );
    assert_ne!(id, post_id_for_link("other", link));
    assert_eq!(
        canonical_url_from_id("eie", &id).as_deref(),
        Some("https://blog.naver.com/eie/223900001")
    );
}

#[test]
fn validation_checks_type_then_shape_then_parse() {
    let ok = check_feed_response("u", Some("text/xml; charset=utf-8"), NAVER_RSS);
    assert!(ok.valid, "{}", ok.message);
    assert_eq!(ok.item_count, Some(2));

    let html = check_feed_response("u", Some("text/html"), "<html></html>");
    assert!(!html.valid);

    let not_feed = check_feed_response("u", Some("application/xml"), "<urlset></urlset>");
    assert!(!not_feed.valid);

    let broken = check_feed_response(
        "u",
        Some("application/rss+xml"),
        "<rss><channel><item><title>x</title></item></channel></rss>",
    );
    assert!(!broken.valid);
}

#[test]
fn naver_feed_urls_are_derived_from_home_pages() {
    assert_eq!(
        derive_feed_url("https://blog.naver.com/eie").as_deref(),
        Some("https://rss.blog.naver.com/eie.xml")
    );
    assert_eq!(
        derive_feed_url("https://m.blog.naver.com/PostList.naver?blogId=eie").as_deref(),
        Some("https://rss.blog.naver.com/eie.xml")
    );
    assert_eq!(derive_feed_url("https://campus.tistory.com"), None);
}
