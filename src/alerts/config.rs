//! Alert configuration types

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Sentence the container monitoring job writes when a Docker host runs too many containers
pub const CONTAINER_WARNING_LINE: &str =
    "The following IIS Docker Hosts has more containers running than the recommended amount of 100!";

/// Last-value threshold for concurrent RDP sessions
pub const RDP_SESSION_THRESHOLD: f64 = 150_000.0;

/// Last-value threshold for detected SQL injection attempts
pub const SQL_INJECTION_THRESHOLD: f64 = 500.0;

/// Monitored signal category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlertKind {
    RdpSessions,
    ContainerCount,
    SqlInjections,
}

impl AlertKind {
    pub const ALL: [AlertKind; 3] = [
        AlertKind::RdpSessions,
        AlertKind::ContainerCount,
        AlertKind::SqlInjections,
    ];

    /// Path segment / JSON name
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::RdpSessions => "rdp-sessions",
            AlertKind::ContainerCount => "container-count",
            AlertKind::SqlInjections => "sql-injections",
        }
    }

    /// Artifact file name the monitoring jobs write to
    pub fn default_artifact(&self) -> &'static str {
        match self {
            AlertKind::RdpSessions => "rdp_data.txt",
            AlertKind::ContainerCount => "container_alert.txt",
            AlertKind::SqlInjections => "sql_injections.txt",
        }
    }

    pub fn default_rule(&self) -> SignalRule {
        match self {
            AlertKind::RdpSessions => SignalRule::LastValueAbove {
                threshold: RDP_SESSION_THRESHOLD,
            },
            AlertKind::ContainerCount => SignalRule::ContainsLine {
                line: CONTAINER_WARNING_LINE.to_string(),
            },
            AlertKind::SqlInjections => SignalRule::LastValueAbove {
                threshold: SQL_INJECTION_THRESHOLD,
            },
        }
    }

    /// Status text reported while the signal is abnormal.
    ///
    /// The dashboard string-matches these, so they must stay byte-for-byte stable.
    pub fn abnormal_message(&self) -> &'static str {
        match self {
            AlertKind::RdpSessions => "ERROR: Abnormal RDP count detected",
            AlertKind::ContainerCount => "ERROR: Container count exceeds allowed maximum",
            AlertKind::SqlInjections => "ERROR: SQL Injection detected",
        }
    }

    /// Response text for a successful pause of `hours`
    pub fn paused_message(&self, hours: f64) -> String {
        match self {
            AlertKind::RdpSessions => format!("Paused RDP alert for {} hours.", hours),
            AlertKind::ContainerCount => "Container alert file has been reset".to_string(),
            AlertKind::SqlInjections => {
                format!("Paused SQL Injection alert for {} hours.", hours)
            }
        }
    }

    /// Response text for a cleared pause
    pub fn cleared_message(&self) -> &'static str {
        match self {
            AlertKind::RdpSessions => "Cleared RDP alert pause.",
            AlertKind::ContainerCount => "Cleared container alert pause.",
            AlertKind::SqlInjections => "Cleared SQL Injection alert pause.",
        }
    }

    /// Environment variable prefix for per-kind overrides
    fn env_prefix(&self) -> &'static str {
        match self {
            AlertKind::RdpSessions => "WATCHPOST_RDP",
            AlertKind::ContainerCount => "WATCHPOST_CONTAINER",
            AlertKind::SqlInjections => "WATCHPOST_SQL",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rdp-sessions" | "rdp" => Ok(AlertKind::RdpSessions),
            "container-count" | "containers" => Ok(AlertKind::ContainerCount),
            "sql-injections" | "sql" => Ok(AlertKind::SqlInjections),
            _ => Err(format!("unknown alert kind: {s}")),
        }
    }
}

/// How the signal is extracted from the artifact and judged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SignalRule {
    /// Trigger when the last non-empty line, read as a number, is > threshold
    LastValueAbove { threshold: f64 },
    /// Trigger when the artifact contains this exact text
    ContainsLine { line: String },
}

/// Which side owns the pause clock for a kind.
///
/// The dashboard keeps its own local pause for the container page and never
/// calls the backend for it; the other pages defer to the backend registry.
/// The backend endpoints behave the same either way, this is reported so
/// clients know which clock to trust.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PauseAuthority {
    Server,
    Client,
}

impl FromStr for PauseAuthority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "server" => Ok(PauseAuthority::Server),
            "client" => Ok(PauseAuthority::Client),
            other => Err(format!("unknown pause authority: {other}")),
        }
    }
}

/// Alert definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertDefinition {
    pub kind: AlertKind,
    /// Text artifact written by the external monitoring job
    pub artifact: PathBuf,
    pub rule: SignalRule,
    pub pause_authority: PauseAuthority,
    /// Truncate the artifact whenever a pause is set
    pub clears_artifact_on_pause: bool,
}

impl AlertDefinition {
    /// Create the stock definition for `kind` with its artifact under `data_dir`
    pub fn new(kind: AlertKind, data_dir: impl AsRef<Path>) -> Self {
        let pause_authority = match kind {
            AlertKind::ContainerCount => PauseAuthority::Client,
            AlertKind::RdpSessions | AlertKind::SqlInjections => PauseAuthority::Server,
        };

        Self {
            kind,
            artifact: data_dir.as_ref().join(kind.default_artifact()),
            rule: kind.default_rule(),
            pause_authority,
            clears_artifact_on_pause: kind == AlertKind::ContainerCount,
        }
    }

    /// Set artifact path
    pub fn with_artifact(mut self, artifact: impl Into<PathBuf>) -> Self {
        self.artifact = artifact.into();
        self
    }

    /// Set pause authority
    pub fn with_pause_authority(mut self, authority: PauseAuthority) -> Self {
        self.pause_authority = authority;
        self
    }

    /// Stock definitions for all kinds, with overrides from the environment:
    ///
    /// - WATCHPOST_RDP_FILE / WATCHPOST_CONTAINER_FILE / WATCHPOST_SQL_FILE:
    ///   artifact path, absolute or relative to `data_dir`
    /// - WATCHPOST_RDP_PAUSE / WATCHPOST_CONTAINER_PAUSE / WATCHPOST_SQL_PAUSE:
    ///   `server` or `client`
    pub fn all_from_env(data_dir: impl AsRef<Path>) -> Vec<AlertDefinition> {
        let data_dir = data_dir.as_ref();

        AlertKind::ALL
            .iter()
            .map(|&kind| {
                let mut definition = AlertDefinition::new(kind, data_dir);
                let prefix = kind.env_prefix();

                if let Ok(file) = std::env::var(format!("{prefix}_FILE")) {
                    definition = definition.with_artifact(data_dir.join(file.trim()));
                }

                if let Ok(raw) = std::env::var(format!("{prefix}_PAUSE")) {
                    match raw.parse::<PauseAuthority>() {
                        Ok(authority) => definition = definition.with_pause_authority(authority),
                        Err(e) => tracing::warn!(kind = %kind, "{}, keeping default", e),
                    }
                }

                definition
            })
            .collect()
    }
}
