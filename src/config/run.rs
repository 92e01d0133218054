// src/config/run.rs
//! Run-level configuration, read from the environment (`.env` is loaded by
//! the binary before this runs).

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::recognition::{RecognitionCriteria, DEFAULT_MIN_CHARS, DEFAULT_MIN_IMAGES};
use crate::scrape::browser::{BrowserlessConfig, DEFAULT_NAVIGATION_TIMEOUT};
use crate::timezone::{format_local, parse_instant, ChallengeWindow};

pub const ENV_CHALLENGE_START: &str = "CHALLENGE_START_DATE";
pub const ENV_CHALLENGE_END: &str = "CHALLENGE_END_DATE";
pub const ENV_MIN_CHARS: &str = "MIN_CHAR_COUNT";
pub const ENV_MIN_IMAGES: &str = "MIN_IMAGE_COUNT";
pub const ENV_BROWSERLESS_URL: &str = "BROWSERLESS_URL";
pub const ENV_BROWSERLESS_TOKEN: &str = "BROWSERLESS_TOKEN";
pub const ENV_NAVIGATION_TIMEOUT: &str = "NAVIGATION_TIMEOUT_SECS";
pub const ENV_FEED_TIMEOUT: &str = "FEED_TIMEOUT_SECS";
pub const ENV_USER_AGENT: &str = "USER_AGENT";
pub const ENV_STORE_DIR: &str = "STORE_DIR";
pub const ENV_METRICS_TEXTFILE: &str = "METRICS_TEXTFILE";

// Local (UTC+9) defaults for the summer challenge.
const DEFAULT_CHALLENGE_START: &str = "2025-06-09 00:00:00";
const DEFAULT_CHALLENGE_END: &str = "2025-07-08 23:59:59";
const DEFAULT_BROWSERLESS_URL: &str = "http://127.0.0.1:3000";
const DEFAULT_FEED_TIMEOUT_SECS: u64 = 15;
const DEFAULT_STORE_DIR: &str = "data";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub window: ChallengeWindow,
    pub criteria: RecognitionCriteria,
    pub browser: BrowserlessConfig,
    pub feed_timeout: Duration,
    pub user_agent: String,
    pub store_dir: PathBuf,
    pub metrics_textfile: Option<PathBuf>,
}

impl RunConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| get(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let start_raw = get(ENV_CHALLENGE_START).unwrap_or_else(|| DEFAULT_CHALLENGE_START.into());
        let end_raw = get(ENV_CHALLENGE_END).unwrap_or_else(|| DEFAULT_CHALLENGE_END.into());
        let start = parse_instant(&start_raw).with_context(|| format!("{ENV_CHALLENGE_START}={start_raw}"))?;
        let end = parse_instant(&end_raw).with_context(|| format!("{ENV_CHALLENGE_END}={end_raw}"))?;
        let window = ChallengeWindow::new(start, end)?;

        let criteria = RecognitionCriteria {
            min_chars: parse_num(&get, ENV_MIN_CHARS, DEFAULT_MIN_CHARS)?,
            min_images: parse_num(&get, ENV_MIN_IMAGES, DEFAULT_MIN_IMAGES)?,
        };

        let navigation_timeout = Duration::from_secs(parse_num(
            &get,
            ENV_NAVIGATION_TIMEOUT,
            DEFAULT_NAVIGATION_TIMEOUT.as_secs(),
        )?);
        let feed_timeout = Duration::from_secs(parse_num(&get, ENV_FEED_TIMEOUT, DEFAULT_FEED_TIMEOUT_SECS)?);
        let user_agent = get(ENV_USER_AGENT).unwrap_or_else(|| DEFAULT_USER_AGENT.into());

        let browser = BrowserlessConfig {
            base_url: get(ENV_BROWSERLESS_URL).unwrap_or_else(|| DEFAULT_BROWSERLESS_URL.into()),
            token: get(ENV_BROWSERLESS_TOKEN),
            navigation_timeout,
            user_agent: user_agent.clone(),
        };

        Ok(Self {
            window,
            criteria,
            browser,
            feed_timeout,
            user_agent,
            store_dir: PathBuf::from(get(ENV_STORE_DIR).unwrap_or_else(|| DEFAULT_STORE_DIR.into())),
            metrics_textfile: get(ENV_METRICS_TEXTFILE).map(PathBuf::from),
        })
    }

    /// One-line summary for the startup log. Never includes the token.
    pub fn describe(&self) -> String {
        format!(
            "window {} (utc {} ~ {}), criteria {} chars / {} images, render via {}",
            self.window.describe(),
            self.window.start().to_rfc3339(),
            self.window.end().to_rfc3339(),
            self.criteria.min_chars,
            self.criteria.min_images,
            self.browser.base_url
        )
    }

    pub fn window_start_local(&self) -> String {
        format_local(self.window.start())
    }
}

fn parse_num<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(v) => v.parse::<T>().with_context(|| format!("{key}={v} is not a number")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn cfg(pairs: &[(&str, &str)]) -> Result<RunConfig> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RunConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let c = cfg(&[]).unwrap();
        assert_eq!(c.criteria, RecognitionCriteria::default());
        assert_eq!(c.window.start().to_rfc3339(), "2025-06-08T15:00:00+00:00");
        assert_eq!(c.window.end().to_rfc3339(), "2025-07-08T14:59:59+00:00");
        assert_eq!(c.browser.navigation_timeout, Duration::from_secs(60));
        assert_eq!(c.feed_timeout, Duration::from_secs(15));
        assert_eq!(c.store_dir, PathBuf::from("data"));
        assert!(c.metrics_textfile.is_none());
    }

    #[test]
    fn overrides_and_blank_values() {
        let c = cfg(&[
            (ENV_MIN_CHARS, "1500"),
            (ENV_MIN_IMAGES, " 5 "),
            (ENV_CHALLENGE_START, "2025-05-10T00:00:00+09:00"),
            (ENV_BROWSERLESS_TOKEN, "   "),
        ])
        .unwrap();
        assert_eq!(c.criteria.min_chars, 1500);
        assert_eq!(c.criteria.min_images, 5);
        assert_eq!(c.window_start_local(), "2025-05-10 00:00:00 +09:00");
        assert!(c.browser.token.is_none());
    }

    #[test]
    fn bad_values_are_errors() {
        assert!(cfg(&[(ENV_MIN_CHARS, "lots")]).is_err());
        assert!(cfg(&[(ENV_CHALLENGE_END, "2024-01-01 00:00:00")]).is_err());
        assert!(cfg(&[(ENV_CHALLENGE_START, "yesterday")]).is_err());
    }
}
