// tests/recognition_rule.rs
use async_trait::async_trait;
use blog_challenge_ingest::is_recognized;
use blog_challenge_ingest::scrape::{BrowserPage, ContentScraper};
use blog_challenge_ingest::validator::validate;
use blog_challenge_ingest::{RecognitionCriteria, ScrapeError};

#[test]
fn both_thresholds_are_inclusive() {
    assert!(is_recognized(1000, 3));
    assert!(is_recognized(1200, 4));
}

#[test]
fn no_partial_credit() {
    assert!(!is_recognized(999, 10));
    assert!(!is_recognized(5000, 2));
    assert!(!is_recognized(0, 0));
}

#[test]
fn custom_thresholds_apply() {
    let c = RecognitionCriteria {
        min_chars: 1500,
        min_images: 5,
    };
    assert!(!c.is_recognized(1200, 4));
    assert!(c.is_recognized(1500, 5));
}

#[tokio::test]
async fn map_widget_images_and_whitespace_do_not_earn_recognition() {
    // 999 visible characters split by whitespace, three real photos plus a map
    // tile; the map is dropped before counting.
    let text = format!("{} {}", "가".repeat(500), "나".repeat(499));
    let html = format!(
        r#"<div class="se-main-container">
             <p>{text}</p>
             <img src="https://postfiles.pstatic.net/1.jpg">
             <img src="https://postfiles.pstatic.net/2.jpg">
             <div class="se-module se-module-map-image">
               <img src="https://simg.pstatic.net/static.map/v2/map/staticmap.bin?w=700">
             </div>
             <img src="https://postfiles.pstatic.net/3.jpg">
           </div>"#
    );
    let scraper = ContentScraper::new(&Default::default()).unwrap();
    let page = StaticPage(html);
    let content = scraper
        .scrape(&page, "https://blog.naver.com/eie/1")
        .await
        .unwrap();
    assert_eq!(content.char_count_no_spaces, 999);
    assert_eq!(content.images.len(), 3);

    let v = validate(&content, &RecognitionCriteria::default());
    assert!(!v.is_valid);
}

struct StaticPage(String);

#[async_trait]
impl BrowserPage for StaticPage {
    async fn goto(&self, _url: &str) -> Result<String, ScrapeError> {
        Ok(self.0.clone())
    }
}
