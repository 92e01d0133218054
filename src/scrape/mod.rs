// src/scrape/mod.rs
pub mod browser;
pub mod extract;
pub mod images;

use std::time::Instant;

use anyhow::Result;
use metrics::histogram;
use serde::{Deserialize, Serialize};

pub use browser::{BrowserLauncher, BrowserPage, BrowserSession, BrowserlessConfig};
pub use extract::CompiledProfile;
pub use images::ImageFilter;

use crate::config::scrape::ScrapeProfile;
use crate::error::ScrapeError;

/// What a rendered post yields. Only `char_count_no_spaces` and `images`
/// feed the recognition rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapedContent {
    pub text: String,
    pub char_count_with_spaces: usize,
    pub char_count_no_spaces: usize,
    /// `src` of every image that survived the filter.
    pub images: Vec<String>,
    pub discarded_images: usize,
}

pub struct ContentScraper {
    profile: CompiledProfile,
}

impl ContentScraper {
    pub fn new(profile: &ScrapeProfile) -> Result<Self> {
        Ok(Self {
            profile: CompiledProfile::compile(profile)?,
        })
    }

    /// Render `url`, descend into the content frame if the template uses
    /// one, and measure the content container. Touches nothing but the
    /// page's navigation state. Timing is recorded whether or not it succeeds.
    pub async fn scrape(&self, page: &dyn BrowserPage, url: &str) -> Result<ScrapedContent, ScrapeError> {
        let t0 = Instant::now();
        let result = self.render_and_extract(page, url).await;
        let outcome = match &result {
            Ok(_) => "ok",
            Err(e) => e.kind(),
        };
        histogram!("pipeline_scrape_ms", "outcome" => outcome)
            .record(t0.elapsed().as_secs_f64() * 1_000.0);
        result
    }

    async fn render_and_extract(
        &self,
        page: &dyn BrowserPage,
        url: &str,
    ) -> Result<ScrapedContent, ScrapeError> {
        let mut html = page.goto(url).await?;

        let frame = self.profile.frame_src(&html, url);
        if let Some(frame_url) = frame {
            tracing::debug!(url, frame_url = %frame_url, "descending into content frame");
            html = page.goto(&frame_url).await?;
        }

        let content = self
            .profile
            .extract(&html)
            .ok_or_else(|| ScrapeError::ContentContainerNotFound {
                url: url.to_string(),
            })?;

        tracing::debug!(
            url,
            chars = content.char_count_no_spaces,
            images = content.images.len(),
            discarded_images = content.discarded_images,
            "content extracted"
        );
        Ok(content)
    }
}
