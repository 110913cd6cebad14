//! Shared utilities for CLI commands.

use std::sync::LazyLock;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use regex::Regex;
use serde::Serialize;
use tk_core::ValidationError;
use tk_core::types::parse_date;

/// Pre-compiled regex for relative day parsing.
static RELATIVE_DAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s+(day|week)s?\s+ago$").unwrap());

/// Conservative bound for relative days (~1000 years).
const MAX_RELATIVE_DAYS: i64 = 1000 * 365;

/// Parse a day argument, resolving relative values against `today`.
///
/// Supports:
/// - Calendar day: "2025-03-10"
/// - RFC 3339, reduced to its UTC day: "2025-03-10T09:30:00Z"
/// - Relative: "today", "3 days ago", "1 week ago"
pub fn parse_day_at(
    value: &str,
    field: &'static str,
    today: NaiveDate,
) -> Result<NaiveDate, ValidationError> {
    let value = value.trim();
    if value == "today" {
        return Ok(today);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc).date_naive());
    }

    let Some(caps) = RELATIVE_DAY_RE.captures(value) else {
        return parse_date(value, field);
    };

    let invalid = ValidationError::InvalidDate { field };
    let n: i64 = caps[1].parse().map_err(|_| invalid.clone())?;
    let days = match &caps[2] {
        "week" => n.checked_mul(7),
        _ => Some(n),
    };
    match days {
        Some(days) if days <= MAX_RELATIVE_DAYS => Ok(today - Duration::days(days)),
        _ => Err(invalid),
    }
}

/// Parse a day argument relative to the current UTC day.
pub fn parse_day(value: &str, field: &'static str) -> Result<NaiveDate, ValidationError> {
    parse_day_at(value, field, Utc::now().date_naive())
}

/// Format whole minutes as "Xh Ym" or "Xm".
pub fn format_minutes(minutes: i64) -> String {
    if minutes < 0 {
        return "0m".to_string();
    }
    let hours = minutes / 60;
    let minutes = minutes % 60;

    if hours >= 1 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// Format an optional estimate, "-" when unset.
pub fn format_estimate(minutes: Option<i64>) -> String {
    minutes.map_or_else(|| "-".to_string(), format_minutes)
}

/// Truncate by characters, not bytes, to avoid panics on multi-byte UTF-8.
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        let kept: String = text.chars().take(width.saturating_sub(3)).collect();
        format!("{kept}...")
    } else {
        text.to_string()
    }
}

/// Pretty-printed JSON for `--json` output.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// JSON body reported after a delete.
#[derive(Debug, Serialize)]
pub struct Deleted<'a> {
    pub deleted: &'a str,
}
