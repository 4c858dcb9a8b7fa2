//! Time formatting for log lines.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Short human form of a run duration: `850ms`, `42.3s`, `2m 05s`, `1h 02m`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs == 0 {
        format!("{}ms", elapsed.subsec_millis())
    } else if secs < 60 {
        format!("{:.1}s", elapsed.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {:02}s", secs / 60, secs % 60)
    } else {
        format!("{}h {:02}m", secs / 3600, (secs % 3600) / 60)
    }
}

/// Render Unix seconds as `YYYY-MM-DD HH:MM:SS UTC`.
pub fn format_utc(unix_secs: u64) -> String {
    i64::try_from(unix_secs)
        .ok()
        .and_then(|t| DateTime::<Utc>::from_timestamp(t, 0))
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| format!("timestamp:{unix_secs}"))
}
