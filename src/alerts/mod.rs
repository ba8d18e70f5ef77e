//! File-backed threshold alerts with pausable reporting
//!
//! Each alert kind reads a text artifact written by an external monitoring
//! job, extracts a signal and compares it against a fixed threshold. A shared
//! pause registry can suppress reporting per kind for a number of hours.

pub mod checker;
pub mod clock;
pub mod config;
pub mod pause;
pub mod status;

pub use checker::{AlertChecker, AlertSummary, CheckError};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AlertDefinition, AlertKind, PauseAuthority, SignalRule};
pub use pause::{ActivePause, PauseOutcome, PauseRegistry};
pub use status::AlertStatus;
