//! Shared formatting helpers for CLI commands.

use std::path::Path;

use chrono::{DateTime, Duration, Utc};

/// Formats a duration as "Xh Ym" if >= 1 hour, "Xm Ys" otherwise.
/// Negative durations are shown as "0m 0s".
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.num_seconds().max(0);
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours >= 1 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m {seconds}s")
    }
}

/// Formats a USD amount with four decimal places.
pub fn format_cost(cost: f64) -> String {
    format!("${cost:.4}")
}

pub fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// File name of `path`, or the full path when it has none.
pub fn display_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}
