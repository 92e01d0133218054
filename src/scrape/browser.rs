// src/scrape/browser.rs
//! Headless browser capability.
//!
//! The pipeline opens one [`BrowserSession`] per run and a fresh
//! [`BrowserPage`] per navigation. The bundled implementation drives a
//! Browserless instance over its HTTP `/content` API, which renders the page
//! in headless Chrome and returns the settled DOM as HTML.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use crate::error::{BrowserError, ScrapeError};

pub const DEFAULT_NAVIGATION_TIMEOUT: Duration = Duration::from_secs(60);
const LAUNCH_PROBE_TIMEOUT: Duration = Duration::from_secs(10);
// Headroom on top of the in-browser navigation timeout for the HTTP round trip.
const TRANSPORT_HEADROOM: Duration = Duration::from_secs(15);

#[async_trait]
pub trait BrowserPage: Send + Sync {
    /// Navigate to `url` and return the rendered document once the network
    /// has settled.
    async fn goto(&self, url: &str) -> Result<String, ScrapeError>;
}

#[async_trait]
pub trait BrowserSession: Send + Sync {
    async fn new_page(&self) -> Result<Box<dyn BrowserPage>, ScrapeError>;
    async fn close(&self);
}

#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, BrowserError>;
}

#[derive(Debug, Clone)]
pub struct BrowserlessConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub navigation_timeout: Duration,
    pub user_agent: String,
}

#[async_trait]
impl BrowserLauncher for BrowserlessConfig {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, BrowserError> {
        let client = reqwest::Client::builder()
            .timeout(self.navigation_timeout + TRANSPORT_HEADROOM)
            .build()
            .map_err(|e| BrowserError::Launch(format!("http client: {e}")))?;
        let base_url = self.base_url.trim_end_matches('/').to_string();

        let mut probe = client
            .get(format!("{base_url}/json/version"))
            .timeout(LAUNCH_PROBE_TIMEOUT);
        if let Some(token) = &self.token {
            probe = probe.query(&[("token", token)]);
        }
        let resp = probe
            .send()
            .await
            .map_err(|e| BrowserError::Launch(format!("{base_url} unreachable: {e}")))?;
        if !resp.status().is_success() {
            return Err(BrowserError::Launch(format!(
                "{base_url} answered {} to the version probe",
                resp.status()
            )));
        }
        tracing::info!(base_url = %base_url, "browser session opened");

        Ok(Box::new(BrowserlessSession {
            client,
            base_url,
            token: self.token.clone(),
            navigation_timeout: self.navigation_timeout,
            user_agent: self.user_agent.clone(),
        }))
    }
}

pub struct BrowserlessSession {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    navigation_timeout: Duration,
    user_agent: String,
}

#[async_trait]
impl BrowserSession for BrowserlessSession {
    async fn new_page(&self) -> Result<Box<dyn BrowserPage>, ScrapeError> {
        Ok(Box::new(BrowserlessPage {
            client: self.client.clone(),
            endpoint: format!("{}/content", self.base_url),
            token: self.token.clone(),
            navigation_timeout: self.navigation_timeout,
            user_agent: self.user_agent.clone(),
        }))
    }

    async fn close(&self) {
        // Browserless tears the browser down after each /content call.
        tracing::info!(base_url = %self.base_url, "browser session closed");
    }
}

pub struct BrowserlessPage {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
    navigation_timeout: Duration,
    user_agent: String,
}

impl BrowserlessPage {
    fn timeout_error(&self, url: &str) -> ScrapeError {
        ScrapeError::NavigationTimeout {
            url: url.to_string(),
            timeout_secs: self.navigation_timeout.as_secs(),
        }
    }
}

#[async_trait]
impl BrowserPage for BrowserlessPage {
    async fn goto(&self, url: &str) -> Result<String, ScrapeError> {
        let body = json!({
            "url": url,
            "gotoOptions": {
                "waitUntil": "networkidle2",
                "timeout": self.navigation_timeout.as_millis() as u64,
            },
            "setExtraHTTPHeaders": { "User-Agent": self.user_agent },
        });

        let mut req = self.client.post(&self.endpoint).json(&body);
        if let Some(token) = &self.token {
            req = req.query(&[("token", token)]);
        }

        let resp = req.send().await.map_err(|e| {
            if e.is_timeout() {
                self.timeout_error(url)
            } else {
                ScrapeError::Navigation {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            if is_navigation_timeout(status.as_u16(), &message) {
                return Err(self.timeout_error(url));
            }
            return Err(ScrapeError::Navigation {
                url: url.to_string(),
                reason: format!("render service status {status}: {}", message.trim()),
            });
        }

        resp.text().await.map_err(|e| {
            if e.is_timeout() {
                self.timeout_error(url)
            } else {
                ScrapeError::Navigation {
                    url: url.to_string(),
                    reason: format!("reading rendered html: {e}"),
                }
            }
        })
    }
}

/// Browserless reports navigation timeouts as 408, or as a 5xx whose body
/// carries puppeteer's `TimeoutError`.
fn is_navigation_timeout(status: u16, message: &str) -> bool {
    let m = message.to_ascii_lowercase();
    status == 408 || status == 504 || (status >= 500 && m.contains("timeout"))
}
