//! Human-readable formatting for sizes, durations and dates

use chrono::NaiveDate;

const SIZE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Format a byte count, e.g. `1536` -> `"1.5 KB"`.
///
/// Zero and negative counts are reported as `"Unknown"`.
pub fn format_size(bytes: i64) -> String {
    if bytes <= 0 {
        return "Unknown".to_string();
    }

    let mut size = bytes as f64;
    for unit in SIZE_UNITS {
        if size < 1024.0 {
            return format!("{:.1} {}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.1} PB", size)
}

/// Format a duration in seconds as `M:SS` or `H:MM:SS`
pub fn format_duration(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "Unknown".to_string();
    }

    let total = seconds as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

/// Format a `YYYYMMDD` upload date as `Month DD, YYYY`.
///
/// Values that do not parse are passed through untouched.
pub fn format_upload_date(date: Option<&str>) -> String {
    match date {
        None | Some("") => "Unknown".to_string(),
        Some(raw) => match NaiveDate::parse_from_str(raw, "%Y%m%d") {
            Ok(parsed) => parsed.format("%B %d, %Y").to_string(),
            Err(_) => raw.to_string(),
        },
    }
}
