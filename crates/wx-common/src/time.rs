//! Time handling utilities for model runs.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};

/// Hours to wait after a cycle's nominal time before its output is
/// considered published.
pub const PUBLICATION_DELAY_HOURS: u32 = 3;

/// Default model cycles (4x daily).
pub const DEFAULT_CYCLES: &[u32] = &[0, 6, 12, 18];

#[derive(Debug, thiserror::Error)]
pub enum TimeParseError {
    #[error("Invalid time format: {0}")]
    InvalidFormat(String),

    #[error("Invalid cycle hour: {0}")]
    InvalidCycle(String),
}

impl From<TimeParseError> for crate::error::WxError {
    fn from(err: TimeParseError) -> Self {
        crate::error::WxError::InvalidConfig(err.to_string())
    }
}

/// Parse a run time from ISO 8601.
///
/// Accepts RFC 3339 (`2024-01-15T12:00:00Z`), a naive datetime assumed UTC
/// (`2024-01-15T12:00:00`, also with minutes only) or a bare date at 00Z.
pub fn parse_run_time(s: &str) -> Result<DateTime<Utc>, TimeParseError> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(Utc.from_utc_datetime(&ndt));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(ndt) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&ndt));
        }
    }

    Err(TimeParseError::InvalidFormat(s.to_string()))
}

/// Date component used in file paths and URLs (`YYYYMMDD`).
pub fn format_run_date(run_time: &DateTime<Utc>) -> String {
    run_time.format("%Y%m%d").to_string()
}

/// Two-digit cycle hour (`00`, `06`, `12`, `18`).
pub fn cycle_hour(run_time: &DateTime<Utc>) -> String {
    format!("{:02}", run_time.hour())
}

/// Parse cycle strings such as `"00"` or `"18"` into hours.
pub fn parse_cycles<S: AsRef<str>>(cycles: &[S]) -> Result<Vec<u32>, TimeParseError> {
    cycles
        .iter()
        .map(|c| {
            let c = c.as_ref();
            c.trim()
                .parse::<u32>()
                .ok()
                .filter(|h| *h < 24)
                .ok_or_else(|| TimeParseError::InvalidCycle(c.to_string()))
        })
        .collect()
}

/// Most recent run whose output should be available at `now`.
///
/// Picks the latest cycle at least [`PUBLICATION_DELAY_HOURS`] old today,
/// else the last cycle of the previous day. An empty cycle list falls back
/// to [`DEFAULT_CYCLES`].
pub fn latest_run_time(now: DateTime<Utc>, cycles: &[u32]) -> DateTime<Utc> {
    let cycles = if cycles.is_empty() { DEFAULT_CYCLES } else { cycles };
    let today = now.date_naive();

    let mut sorted = cycles.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));

    let at_hour = |date: NaiveDate, hour: u32| {
        date.and_hms_opt(hour, 0, 0)
            .map(|ndt| Utc.from_utc_datetime(&ndt))
    };

    if let Some(run) = sorted
        .iter()
        .find(|&&cycle| now.hour() >= cycle + PUBLICATION_DELAY_HOURS)
        .and_then(|&cycle| at_hour(today, cycle))
    {
        return run;
    }

    let yesterday = today - Duration::days(1);
    sorted
        .first()
        .and_then(|&cycle| at_hour(yesterday, cycle))
        .unwrap_or(now)
}
