//! In-memory pause registry
//!
//! Holds one optional "paused until" timestamp per alert kind. A timestamp
//! that has already elapsed is left in place and simply stops counting; only
//! an explicit clear removes it. Nothing here survives a restart.

use std::collections::HashMap;

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::RwLock;
use serde::Serialize;

use super::config::AlertKind;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Result of a pause-set request
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PauseOutcome {
    Paused { until: DateTime<Utc>, hours: f64 },
    Cleared,
}

/// Active pause for one kind
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ActivePause {
    pub kind: AlertKind,
    pub until: DateTime<Utc>,
}

/// Per-kind pause state shared by all request handlers
#[derive(Debug, Default)]
pub struct PauseRegistry {
    entries: RwLock<HashMap<AlertKind, DateTime<Utc>>>,
}

impl PauseRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// True iff a pause is stored for `kind` and `now` is strictly before it
    pub fn is_paused(&self, kind: AlertKind, now: DateTime<Utc>) -> bool {
        self.paused_until(kind, now).is_some()
    }

    /// Stored pause timestamp, if it is still in effect at `now`
    pub fn paused_until(&self, kind: AlertKind, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.entries
            .read()
            .get(&kind)
            .copied()
            .filter(|until| now < *until)
    }

    /// Pause `kind` for `hours` from `now`, or clear it.
    ///
    /// Any positive number replaces the previous pause outright. `None`, zero,
    /// negative and NaN all clear.
    pub fn set_pause(&self, kind: AlertKind, hours: Option<f64>, now: DateTime<Utc>) -> PauseOutcome {
        let hours = match hours {
            Some(h) if h > 0.0 => h,
            _ => {
                self.clear_pause(kind);
                return PauseOutcome::Cleared;
            }
        };

        let until = pause_deadline(now, hours);
        self.entries.write().insert(kind, until);

        tracing::info!(kind = %kind, until = %until.to_rfc3339(), "Alert paused");
        PauseOutcome::Paused { until, hours }
    }

    /// Remove any pause for `kind`
    pub fn clear_pause(&self, kind: AlertKind) {
        if self.entries.write().remove(&kind).is_some() {
            tracing::info!(kind = %kind, "Alert pause cleared");
        } else {
            tracing::debug!(kind = %kind, "Alert pause clear requested, none stored");
        }
    }

    /// Pauses in effect at `now`
    pub fn snapshot(&self, now: DateTime<Utc>) -> Vec<ActivePause> {
        let entries = self.entries.read();
        AlertKind::ALL
            .iter()
            .filter_map(|kind| {
                entries
                    .get(kind)
                    .filter(|until| now < **until)
                    .map(|until| ActivePause {
                        kind: *kind,
                        until: *until,
                    })
            })
            .collect()
    }
}

/// `now + hours`, saturating at the largest representable time
fn pause_deadline(now: DateTime<Utc>, hours: f64) -> DateTime<Utc> {
    // round up so any positive duration covers `now`; float-to-int casts
    // saturate, so absurd durations land on i64::MAX
    let millis = (hours * MILLIS_PER_HOUR).ceil() as i64;

    TimeDelta::try_milliseconds(millis)
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
