//! Alert status and its legacy text rendering

use std::fmt;

use chrono::{DateTime, Utc};

use super::config::AlertKind;

/// Outcome of one alert evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertStatus {
    Ok,
    /// Suppressed by a pause; callers treat this as OK
    Paused { until: DateTime<Utc> },
    Abnormal(AlertKind),
}

impl AlertStatus {
    /// Whether the dashboard should hide its alert banner
    pub fn is_ok(&self) -> bool {
        !matches!(self, AlertStatus::Abnormal(_))
    }
}

/// Renders the plain-text strings the dashboard matches on:
/// `OK`, `OK - Paused until: <date>` or the kind's `ERROR: ...` line.
impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertStatus::Ok => f.write_str("OK"),
            AlertStatus::Paused { until } => {
                write!(f, "OK - Paused until: {}", format_js_date(until))
            }
            AlertStatus::Abnormal(kind) => f.write_str(kind.abnormal_message()),
        }
    }
}

/// Format a timestamp the way a JavaScript `Date` prints itself, pinned to UTC
pub fn format_js_date(at: &DateTime<Utc>) -> String {
    at.format("%a %b %d %Y %H:%M:%S GMT+0000 (Coordinated Universal Time)")
        .to_string()
}
