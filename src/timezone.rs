// src/timezone.rs
//! Time normalization between UTC and the challenge's local civil time.
//!
//! Local time is a fixed UTC+9 offset with no daylight-saving rules. All
//! window comparisons go through [`ChallengeWindow::contains`], which puts
//! the boundary and the candidate into the same representation first.

use anyhow::{anyhow, Result};
use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, TimeZone, Utc};

/// Offset of local time from UTC, in seconds.
pub const LOCAL_OFFSET_SECS: i32 = 9 * 3600;

pub type LocalInstant = DateTime<FixedOffset>;

pub fn local_offset() -> FixedOffset {
    // 9h is always within the ±24h range accepted by chrono.
    FixedOffset::east_opt(LOCAL_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

pub fn to_local(utc: DateTime<Utc>) -> LocalInstant {
    utc.with_timezone(&local_offset())
}

pub fn to_utc(local: LocalInstant) -> DateTime<Utc> {
    local.with_timezone(&Utc)
}

/// Human-readable local rendering for logs, e.g. `2025-06-09 00:00:00 +09:00`.
pub fn format_local(utc: DateTime<Utc>) -> String {
    to_local(utc).format("%Y-%m-%d %H:%M:%S %:z").to_string()
}

/// Parse a configured instant.
///
/// Accepts an RFC 3339 timestamp with an explicit offset (taken as-is), or a
/// naive `YYYY-MM-DD HH:MM:SS` / `YYYY-MM-DDTHH:MM:SS` string interpreted as
/// local time.
pub fn parse_instant(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return local_offset()
                .from_local_datetime(&naive)
                .single()
                .map(to_utc)
                .ok_or_else(|| anyhow!("ambiguous local time: {s}"));
        }
    }
    Err(anyhow!("unrecognized instant {s:?} (want RFC 3339 or YYYY-MM-DD HH:MM:SS)"))
}

/// Inclusive challenge window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChallengeWindow {
    start: LocalInstant,
    end: LocalInstant,
}

impl ChallengeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start > end {
            return Err(anyhow!(
                "challenge window start {} is after end {}",
                format_local(start),
                format_local(end)
            ));
        }
        Ok(Self {
            start: to_local(start),
            end: to_local(end),
        })
    }

    pub fn start(&self) -> DateTime<Utc> {
        to_utc(self.start)
    }

    pub fn end(&self) -> DateTime<Utc> {
        to_utc(self.end)
    }

    /// Both bounds are inclusive.
    pub fn contains(&self, published_at: DateTime<Utc>) -> bool {
        let candidate = to_local(published_at);
        candidate >= self.start && candidate <= self.end
    }

    pub fn describe(&self) -> String {
        format!(
            "{} ~ {}",
            self.start.format("%Y-%m-%d %H:%M:%S"),
            self.end.format("%Y-%m-%d %H:%M:%S %:z")
        )
    }
}
