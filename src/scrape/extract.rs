// src/scrape/extract.rs
//! DOM work on a rendered page: find the content container, drop widget
//! subtrees, collect visible text and content images.
//!
//! `scraper::Html` is not `Send`, so everything here is synchronous and
//! takes the HTML as a string; callers await the navigation first.

use std::collections::HashSet;

use anyhow::{anyhow, Result};
use scraper::{Html, Node, Selector};
use url::Url;

use super::images::ImageFilter;
use super::ScrapedContent;
use crate::config::scrape::ScrapeProfile;
use crate::validator::{count_chars_no_spaces, count_chars_with_spaces};

const NON_VISIBLE: &str = "script, style, noscript, template";
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "br", "li", "tr", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote", "pre",
];

fn parse_selector(raw: &str) -> Result<Selector> {
    Selector::parse(raw).map_err(|e| anyhow!("invalid css selector {raw:?}: {e:?}"))
}

fn parse_all(raw: &[String]) -> Result<Vec<Selector>> {
    raw.iter().map(|s| parse_selector(s)).collect()
}

/// A scrape profile with its selectors parsed once up front.
#[derive(Debug)]
pub struct CompiledProfile {
    frames: Vec<Selector>,
    containers: Vec<Selector>,
    removals: Vec<Selector>,
    non_visible: Selector,
    img: Selector,
    image_filter: ImageFilter,
}

impl CompiledProfile {
    pub fn compile(profile: &ScrapeProfile) -> Result<Self> {
        if profile.container_selectors.is_empty() {
            return Err(anyhow!("scrape profile lists no container selectors"));
        }
        Ok(Self {
            frames: parse_all(&profile.frame_selectors)?,
            containers: parse_all(&profile.container_selectors)?,
            removals: parse_all(&profile.remove_selectors)?,
            non_visible: parse_selector(NON_VISIBLE)?,
            img: parse_selector("img")?,
            image_filter: profile.image_filter.clone(),
        })
    }

    /// Absolute URL of the first matching content frame, if the page wraps
    /// its post in one.
    pub fn frame_src(&self, html: &str, page_url: &str) -> Option<String> {
        if self.frames.is_empty() {
            return None;
        }
        let doc = Html::parse_document(html);
        let src = self
            .frames
            .iter()
            .find_map(|sel| doc.select(sel).find_map(|f| f.value().attr("src")))?;
        let base = Url::parse(page_url).ok()?;
        base.join(src.trim()).ok().map(String::from)
    }

    /// `None` when no container selector matches.
    pub fn extract(&self, html: &str) -> Option<ScrapedContent> {
        let doc = Html::parse_document(html);
        let container = self
            .containers
            .iter()
            .find_map(|sel| doc.select(sel).next())?;

        // Everything under a removed widget or a non-rendered element.
        let mut hidden = HashSet::new();
        for sel in self.removals.iter().chain(std::iter::once(&self.non_visible)) {
            for el in container.select(sel) {
                hidden.extend(el.descendants().map(|n| n.id()));
            }
        }

        let mut raw = String::new();
        for node in container.descendants() {
            if hidden.contains(&node.id()) {
                continue;
            }
            match node.value() {
                // Source newlines are layout, not content; only blocks break lines.
                Node::Text(t) => raw.extend(t.chars().map(|c| if c.is_whitespace() { ' ' } else { c })),
                Node::Element(e) if BLOCK_TAGS.contains(&e.name()) => raw.push('\n'),
                _ => {}
            }
        }
        let text = collapse_lines(&raw);

        let mut images = Vec::new();
        let mut discarded_images = 0usize;
        for img in container.select(&self.img) {
            if hidden.contains(&img.id()) {
                continue;
            }
            let el = img.value();
            let Some(src) = el.attr("src") else { continue };
            if self.image_filter.keep(src, el.attr("width"), el.attr("height")) {
                images.push(src.to_string());
            } else {
                discarded_images += 1;
            }
        }

        Some(ScrapedContent {
            char_count_with_spaces: count_chars_with_spaces(&text),
            char_count_no_spaces: count_chars_no_spaces(&text),
            text,
            images,
            discarded_images,
        })
    }
}

/// One space between words, no blank lines, no leading or trailing blanks.
fn collapse_lines(raw: &str) -> String {
    raw.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> CompiledProfile {
        CompiledProfile::compile(&ScrapeProfile::default()).unwrap()
    }

    #[test]
    fn map_widgets_and_scripts_do_not_count() {
        let html = r#"<html><body>
          <div class="se-main-container">
            <p>hello world</p>
            <div class="se-module se-module-map-text">Gangnam station exit 3</div>
            <div class="se-module se-module-map-image">
              <img src="https://simg.pstatic.net/static.map/v2/map/staticmap.bin?w=700">
              <img src="https://postfiles.pstatic.net/not-a-tile.jpg">
            </div>
            <script>var tracking = "lots of characters";</script>
            <img src="https://postfiles.pstatic.net/a.jpg">
            <img src="https://postfiles.pstatic.net/icon.png" width="16" height="16">
            <img data-lazy-src="https://postfiles.pstatic.net/lazy.jpg">
          </div>
        </body></html>"#;
        let c = profile().extract(html).unwrap();
        assert_eq!(c.text, "hello world");
        assert_eq!(c.char_count_no_spaces, 10);
        assert_eq!(c.char_count_with_spaces, 11);
        assert_eq!(c.images, vec!["https://postfiles.pstatic.net/a.jpg".to_string()]);
        assert_eq!(c.discarded_images, 1);
    }

    #[test]
    fn source_indentation_does_not_inflate_the_count() {
        let html = "<div class='se-main-container'>
            <p>
                first    line
            </p>
            <p>second\tline</p>


            <div><span>third</span> <span>line</span></div>
        </div>";
        let c = profile().extract(html).unwrap();
        assert_eq!(c.text, "first line\nsecond line\nthird line");
        assert_eq!(c.char_count_with_spaces, 33);
        assert_eq!(c.char_count_no_spaces, 28);
    }

    #[test]
    fn container_candidates_are_tried_in_order() {
        let html = r#"<div id="postViewArea"><p>old editor</p></div>"#;
        let c = profile().extract(html).unwrap();
        assert_eq!(c.text, "old editor");
        assert!(profile().extract("<div class='other'>x</div>").is_none());
    }

    #[test]
    fn frame_src_is_resolved_against_page_url() {
        let html = r#"<iframe id="mainFrame" src="/PostView.naver?blogId=eie&amp;logNo=1"></iframe>"#;
        assert_eq!(
            profile().frame_src(html, "https://blog.naver.com/eie/1").as_deref(),
            Some("https://blog.naver.com/PostView.naver?blogId=eie&logNo=1")
        );
        assert_eq!(profile().frame_src("<p>no frame</p>", "https://x/"), None);
    }

    #[test]
    fn bad_selectors_fail_compilation() {
        let p = ScrapeProfile {
            container_selectors: vec!["div[".into()],
            ..ScrapeProfile::default()
        };
        assert!(CompiledProfile::compile(&p).is_err());
    }
}
