use std::time::Duration;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use rand::{Rng, distr::Alphanumeric};
use serde_json::Value;

/// Random value for the OAuth `state` parameter.
pub fn generate_state() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

/// Renders an RFC 3339 timestamp as `YYYY-MM-DD HH:MM:SS` in UTC.
pub fn format_played_at(raw: &str) -> Option<String> {
    let parsed = DateTime::parse_from_rfc3339(raw).ok()?;
    Some(
        parsed
            .with_timezone(&Utc)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
    )
}

/// Year of a Spotify release date, which comes with `day`, `month` or
/// `year` precision.
pub fn parse_release_year(raw: &str) -> Option<i32> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date.year());
    }
    if let Ok(date) = NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d") {
        return Some(date.year());
    }
    if raw.len() == 4 {
        return raw.parse::<i32>().ok();
    }
    None
}

/// Milliseconds to minutes; anything that is not a number becomes null.
pub fn ms_to_minutes(value: &Value) -> Value {
    value
        .as_f64()
        .map(|ms| Value::from(ms / 60000.0))
        .unwrap_or(Value::Null)
}

pub fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb
}
