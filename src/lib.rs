//! Watchpost: threshold alerts over file-based monitoring artifacts
//!
//! External monitoring jobs drop plain-text files on disk (a numeric series
//! of RDP session counts, a numeric series of SQL injection hits, a free-text
//! Docker container report). Watchpost reads them on request, applies a fixed
//! threshold per alert kind and answers with the status strings a polling
//! dashboard matches on.
//!
//! # Features
//!
//! - **Alert checks**: last-value thresholds and fixed-sentence detection
//! - **Pausing**: per-kind, time-bounded suppression held in memory
//! - **Container reset**: pausing the container alert also empties its report
//! - **Summary API**: JSON view of every kind's status and pause
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use watchpost::alerts::{AlertChecker, AlertKind, PauseRegistry};
//!
//! # async fn run() -> Result<(), watchpost::alerts::CheckError> {
//! let checker = AlertChecker::with_data_dir("/srv/monitoring", Arc::new(PauseRegistry::new()));
//!
//! let now = chrono::Utc::now();
//! checker.pause(AlertKind::RdpSessions, Some(24.0), now).await?;
//!
//! let status = checker.evaluate(AlertKind::RdpSessions, now).await?;
//! println!("{}", status); // OK - Paused until: ...
//! # Ok(())
//! # }
//! ```

pub mod alerts;
pub mod api;

// Re-export commonly used types
pub use alerts::{AlertChecker, AlertKind, AlertStatus, CheckError, PauseRegistry};
