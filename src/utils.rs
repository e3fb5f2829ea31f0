use chrono::{DateTime, NaiveDate, Utc};
use std::path::PathBuf;

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| std::env::current_dir().unwrap_or_default())
}

/// ~/.precog
pub fn precog_dir() -> PathBuf {
    home_dir().join(".precog")
}

/// Expands a leading `~` to the home directory
pub fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" {
        return home_dir();
    }
    match path.strip_prefix("~/") {
        Some(rest) => home_dir().join(rest),
        None => PathBuf::from(path),
    }
}

/// Parses an RFC 3339 timestamp or a plain `YYYY-MM-DD` date (midnight UTC)
pub fn parse_date_arg(value: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc))
        .ok_or_else(|| format!("invalid date '{}', expected YYYY-MM-DD or RFC 3339", value))
}

/// Human readable remaining lifetime, e.g. "in 5 minutes" or "expired 2 hours ago"
pub fn format_expiry(expires_at: &DateTime<Utc>) -> String {
    let now = Utc::now();
    let remaining = expires_at.signed_duration_since(now);
    let (amount, past) = if remaining.num_seconds() < 0 {
        (-remaining, true)
    } else {
        (remaining, false)
    };

    let text = if amount.num_days() > 0 {
        format!("{} days", amount.num_days())
    } else if amount.num_hours() > 0 {
        format!("{} hours", amount.num_hours())
    } else if amount.num_minutes() > 0 {
        format!("{} minutes", amount.num_minutes())
    } else {
        format!("{} seconds", amount.num_seconds())
    };

    if past {
        format!("expired {} ago", text)
    } else {
        format!("in {}", text)
    }
}
