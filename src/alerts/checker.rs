//! Artifact-backed alert checker

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::config::{AlertDefinition, AlertKind, PauseAuthority, SignalRule};
use super::pause::{PauseOutcome, PauseRegistry};
use super::status::AlertStatus;

/// Evaluates alert kinds against their artifacts, honoring the pause registry
pub struct AlertChecker {
    /// Definitions keyed by kind
    definitions: HashMap<AlertKind, AlertDefinition>,
    /// Shared pause state
    registry: Arc<PauseRegistry>,
}

/// Per-kind line of the status summary
#[derive(Debug, Clone, Serialize)]
pub struct AlertSummary {
    pub kind: AlertKind,
    /// Legacy status text, absent when the artifact could not be read
    pub status: Option<String>,
    pub abnormal: bool,
    pub paused_until: Option<DateTime<Utc>>,
    pub pause_authority: PauseAuthority,
    pub artifact: String,
    pub error: Option<String>,
}

impl AlertChecker {
    /// Create a checker over the given definitions
    pub fn new(
        definitions: impl IntoIterator<Item = AlertDefinition>,
        registry: Arc<PauseRegistry>,
    ) -> Self {
        Self {
            definitions: definitions
                .into_iter()
                .map(|definition| (definition.kind, definition))
                .collect(),
            registry,
        }
    }

    /// Stock definitions for every kind with artifacts under `data_dir`
    pub fn with_data_dir(data_dir: impl AsRef<Path>, registry: Arc<PauseRegistry>) -> Self {
        let data_dir = data_dir.as_ref();
        Self::new(
            AlertKind::ALL
                .iter()
                .map(|&kind| AlertDefinition::new(kind, data_dir)),
            registry,
        )
    }

    pub fn registry(&self) -> &Arc<PauseRegistry> {
        &self.registry
    }

    /// Get the definition for a kind
    pub fn definition(&self, kind: AlertKind) -> Result<&AlertDefinition, CheckError> {
        self.definitions
            .get(&kind)
            .ok_or(CheckError::NotConfigured(kind))
    }

    /// Evaluate one kind at `now`.
    ///
    /// A pause in effect wins before any file access, so a missing or broken
    /// artifact still reports OK while paused.
    pub async fn evaluate(
        &self,
        kind: AlertKind,
        now: DateTime<Utc>,
    ) -> Result<AlertStatus, CheckError> {
        let definition = self.definition(kind)?;

        if let Some(until) = self.registry.paused_until(kind, now) {
            tracing::debug!(kind = %kind, until = %until.to_rfc3339(), "Alert paused, skipping check");
            return Ok(AlertStatus::Paused { until });
        }

        let content = read_artifact_file(definition).await?;

        if Self::is_abnormal(&definition.rule, &content) {
            tracing::error!(kind = %kind, "{}", kind.abnormal_message());
            Ok(AlertStatus::Abnormal(kind))
        } else {
            Ok(AlertStatus::Ok)
        }
    }

    /// Raw artifact text for a kind
    pub async fn read_artifact(&self, kind: AlertKind) -> Result<String, CheckError> {
        let definition = self.definition(kind)?;
        read_artifact_file(definition).await
    }

    /// Set or clear the pause for a kind.
    ///
    /// For kinds that clear their artifact on pause, the pause is committed
    /// first and the file truncated afterwards. If truncation fails the pause
    /// stays in place and the error is returned.
    pub async fn pause(
        &self,
        kind: AlertKind,
        hours: Option<f64>,
        now: DateTime<Utc>,
    ) -> Result<PauseOutcome, CheckError> {
        let definition = self.definition(kind)?;
        let outcome = self.registry.set_pause(kind, hours, now);

        if matches!(outcome, PauseOutcome::Paused { .. }) && definition.clears_artifact_on_pause {
            tokio::fs::write(&definition.artifact, b"")
                .await
                .map_err(|source| CheckError::Write {
                    kind,
                    path: definition.artifact.clone(),
                    source,
                })?;

            tracing::info!(
                kind = %kind,
                artifact = %definition.artifact.display(),
                "Alert artifact has been reset"
            );
        }

        Ok(outcome)
    }

    /// Evaluate every configured kind. Read failures are reported per kind.
    pub async fn summary(&self, now: DateTime<Utc>) -> Vec<AlertSummary> {
        let mut summaries = Vec::with_capacity(self.definitions.len());
        let pauses = self.registry.snapshot(now);

        for kind in AlertKind::ALL {
            let Some(definition) = self.definitions.get(&kind) else {
                continue;
            };

            let (status, error) = match self.evaluate(kind, now).await {
                Ok(status) => (Some(status), None),
                Err(e) => {
                    tracing::warn!(kind = %kind, error = %e, "Alert check failed");
                    (None, Some(e.to_string()))
                }
            };

            summaries.push(AlertSummary {
                kind,
                abnormal: status.map(|s| !s.is_ok()).unwrap_or(false),
                status: status.map(|s| s.to_string()),
                paused_until: pauses
                    .iter()
                    .find(|pause| pause.kind == kind)
                    .map(|pause| pause.until),
                pause_authority: definition.pause_authority,
                artifact: definition.artifact.display().to_string(),
                error,
            });
        }

        summaries
    }

    /// Apply a signal rule to artifact content
    fn is_abnormal(rule: &SignalRule, content: &str) -> bool {
        match rule {
            SignalRule::LastValueAbove { threshold } => last_value(content)
                .map(|value| value > *threshold)
                .unwrap_or(false),
            SignalRule::ContainsLine { line } => content.contains(line.as_str()),
        }
    }
}

async fn read_artifact_file(definition: &AlertDefinition) -> Result<String, CheckError> {
    let bytes = tokio::fs::read(&definition.artifact)
        .await
        .map_err(|source| CheckError::Read {
            kind: definition.kind,
            path: definition.artifact.clone(),
            source,
        })?;

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Last non-empty line of a numeric series, read as a number (NaN if it isn't one)
fn last_value(content: &str) -> Option<f64> {
    content
        .lines()
        .map(trim_line)
        .filter(|line| !line.is_empty())
        .last()
        .map(parse_number)
}

/// Whitespace trim that also drops the byte order mark Windows tools prepend
fn trim_line(line: &str) -> &str {
    line.trim_matches(|c: char| c.is_whitespace() || c == '\u{FEFF}')
}

/// Numeric conversion matching how the monitoring dashboard reads these files:
/// decimal literals and `Infinity` parse, anything else is NaN.
fn parse_number(text: &str) -> f64 {
    let unsigned = text.strip_prefix(['+', '-']).unwrap_or(text);

    if unsigned == "Infinity" {
        return if text.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }

    if !is_decimal_literal(unsigned) {
        return f64::NAN;
    }

    text.parse().unwrap_or(f64::NAN)
}

fn is_decimal_literal(text: &str) -> bool {
    let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());

    let (mantissa, exponent) = match text.find(['e', 'E']) {
        Some(idx) => (&text[..idx], Some(&text[idx + 1..])),
        None => (text, None),
    };

    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return false;
    }
    if !all_digits(int_part) || !all_digits(frac_part) {
        return false;
    }

    match exponent {
        None => true,
        Some(exp) => {
            let exp = exp.strip_prefix(['+', '-']).unwrap_or(exp);
            !exp.is_empty() && all_digits(exp)
        }
    }
}

/// Alert check errors
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error("Failed to read {} for {kind}: {source}", .path.display())]
    Read {
        kind: AlertKind,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to reset {} for {kind}: {source}", .path.display())]
    Write {
        kind: AlertKind,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("No alert definition for {0}")]
    NotConfigured(AlertKind),
}
