//! Configuration for the triage engine and the Jira connection.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

use crate::error::TriageError;

/// Tunable thresholds, cooldown windows and audit markers.
///
/// Passed by reference into the classifier, planner, cooldown tracker and
/// executor so tests can run arbitrary threshold combinations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TriageConfig {
    /// Status name treated as "blocked on support".
    pub blocked_status: String,
    /// Summary substring that forces HIGH (case-insensitive).
    pub override_marker: String,
    /// Hours without update before a blocked issue counts as stale.
    pub medium_stale_hours: f64,
    /// Hours without update before a blocked issue escalates to HIGH.
    pub high_stale_hours: f64,
    /// First-response hours remaining at or below which the tier is at least MEDIUM.
    pub medium_sla_hours: f64,
    /// First-response hours remaining at or below which the tier is HIGH.
    pub high_sla_hours: f64,
    /// Minimum hours between two request-update comments.
    pub request_update_window_hours: f64,
    /// Minimum hours between two playbook notes.
    pub playbook_note_window_hours: f64,
    /// Audit tag prefixed to request-update comments.
    pub request_update_marker: String,
    /// Audit tag prefixed to playbook notes.
    pub playbook_note_marker: String,
    /// Audit tag prefixed to escalation comments.
    pub escalation_marker: String,
    /// Label applied when an issue is escalated.
    pub escalation_label: String,
    /// Maximum issues fetched per scope query.
    pub search_limit: u32,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            blocked_status: "Waiting for support".to_string(),
            override_marker: "[URGENT]".to_string(),
            medium_stale_hours: 24.0,
            high_stale_hours: 72.0,
            medium_sla_hours: 8.0,
            high_sla_hours: 2.0,
            request_update_window_hours: 24.0,
            playbook_note_window_hours: 24.0,
            request_update_marker: "[triage:request-update]".to_string(),
            playbook_note_marker: "[triage:playbook-note]".to_string(),
            escalation_marker: "[triage:escalation]".to_string(),
            escalation_label: "triage-escalated".to_string(),
            search_limit: 50,
        }
    }
}

impl TriageConfig {
    /// Defaults overlaid with `TRIAGE_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Load a (partial) JSON config file, then apply environment overrides.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TriageError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            TriageError::InvalidConfig(format!("cannot read {}: {e}", path.display()))
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|e| {
            TriageError::InvalidConfig(format!("cannot parse {}: {e}", path.display()))
        })?;
        let config = config.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn with_env_overrides(mut self) -> Self {
        if let Some(v) = env_string("TRIAGE_BLOCKED_STATUS") {
            self.blocked_status = v;
        }
        if let Some(v) = env_string("TRIAGE_OVERRIDE_MARKER") {
            self.override_marker = v;
        }
        if let Some(v) = env_parse("TRIAGE_MEDIUM_STALE_HOURS") {
            self.medium_stale_hours = v;
        }
        if let Some(v) = env_parse("TRIAGE_HIGH_STALE_HOURS") {
            self.high_stale_hours = v;
        }
        if let Some(v) = env_parse("TRIAGE_MEDIUM_SLA_HOURS") {
            self.medium_sla_hours = v;
        }
        if let Some(v) = env_parse("TRIAGE_HIGH_SLA_HOURS") {
            self.high_sla_hours = v;
        }
        if let Some(v) = env_parse("TRIAGE_REQUEST_UPDATE_WINDOW_HOURS") {
            self.request_update_window_hours = v;
        }
        if let Some(v) = env_parse("TRIAGE_PLAYBOOK_NOTE_WINDOW_HOURS") {
            self.playbook_note_window_hours = v;
        }
        if let Some(v) = env_string("TRIAGE_ESCALATION_LABEL") {
            self.escalation_label = v;
        }
        if let Some(v) = env_parse("TRIAGE_SEARCH_LIMIT") {
            self.search_limit = v;
        }
        self
    }

    /// Reject inverted thresholds and empty markers.
    pub fn validate(&self) -> Result<(), TriageError> {
        if self.medium_stale_hours > self.high_stale_hours {
            return Err(TriageError::InvalidConfig(format!(
                "medium stale threshold ({}h) exceeds high stale threshold ({}h)",
                self.medium_stale_hours, self.high_stale_hours
            )));
        }
        if self.high_sla_hours > self.medium_sla_hours {
            return Err(TriageError::InvalidConfig(format!(
                "high SLA threshold ({}h) exceeds medium SLA threshold ({}h)",
                self.high_sla_hours, self.medium_sla_hours
            )));
        }
        if self.request_update_window_hours <= 0.0 || self.playbook_note_window_hours <= 0.0 {
            return Err(TriageError::InvalidConfig(
                "cooldown windows must be positive".to_string(),
            ));
        }
        let markers = [
            &self.request_update_marker,
            &self.playbook_note_marker,
            &self.escalation_marker,
        ];
        if markers.iter().any(|m| m.trim().is_empty()) {
            return Err(TriageError::InvalidConfig(
                "audit markers must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Jira connection settings.
#[derive(Clone)]
pub struct TrackerConfig {
    /// Jira site URL, e.g. `https://example.atlassian.net`.
    pub base_url: String,
    /// Account email for basic auth.
    pub email: String,
    /// API token for basic auth.
    pub api_token: String,
    /// Default project key used when a caller does not name one.
    pub project_key: Option<String>,
    /// Custom field holding the SLA payload.
    pub sla_field: String,
}

impl TrackerConfig {
    /// Load from `JIRA_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            base_url: env::var("JIRA_BASE_URL").unwrap_or_default(),
            email: env::var("JIRA_EMAIL").unwrap_or_default(),
            api_token: env::var("JIRA_API_TOKEN").unwrap_or_default(),
            project_key: env_string("JIRA_PROJECT_KEY"),
            sla_field: env::var("JIRA_SLA_FIELD")
                .unwrap_or_else(|_| "customfield_10030".to_string()),
        }
    }
}

impl std::fmt::Debug for TrackerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackerConfig")
            .field("base_url", &self.base_url)
            .field("email", &self.email)
            .field("api_token", &"<redacted>")
            .field("project_key", &self.project_key)
            .field("sla_field", &self.sla_field)
            .finish()
    }
}

fn env_string(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.trim().parse().ok())
}
