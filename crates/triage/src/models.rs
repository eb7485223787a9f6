//! Core data types shared across the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::risk::RiskReason;

// =========================================================================
// Tracker projections
// =========================================================================

/// Read-only projection of an issue as returned by the tracker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueSnapshot {
    pub key: String,
    pub summary: String,
    pub status: String,
    pub updated: Option<DateTime<Utc>>,
    pub assignee: Option<Assignee>,
    #[serde(default)]
    pub labels: Vec<String>,
    /// Raw SLA payload; its shape is not guaranteed.
    pub sla: Option<Value>,
}

impl IssueSnapshot {
    /// Whether the given label is already applied (exact match).
    #[must_use]
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }
}

/// Assignee identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignee {
    pub account_id: String,
    pub display_name: Option<String>,
}

impl Assignee {
    /// Name for display, falling back to the account id.
    #[must_use]
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.account_id)
    }
}

/// A single comment from an issue's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Option<String>,
    pub created: Option<DateTime<Utc>>,
    /// Rich-text body as delivered by the tracker.
    pub body: Value,
}

// =========================================================================
// Derived signals
// =========================================================================

/// Clean temporal and ownership signals derived from a snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signals {
    /// Hours since the last update, `None` when the tracker sent no timestamp.
    pub stale_hours: Option<f64>,
    pub is_blocked: bool,
    pub is_unassigned: bool,
    pub manual_override: bool,
    /// Hours until the first-response goal is breached, `None` if unknown.
    pub first_response_remaining_hours: Option<f64>,
}

/// Risk tier, ordered from least to most urgent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskTier {
    #[default]
    Normal,
    Medium,
    High,
}

impl RiskTier {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =========================================================================
// Actions and results
// =========================================================================

/// Fixed remediation action vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    AssignOwner,
    RequestUpdate,
    PostInternalNote,
    GenerateCustomerDraft,
    Escalate,
}

impl Action {
    /// Stable machine key used in step results.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::AssignOwner => "assign_owner",
            Self::RequestUpdate => "request_update",
            Self::PostInternalNote => "post_internal_note",
            Self::GenerateCustomerDraft => "generate_customer_draft",
            Self::Escalate => "escalate",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::AssignOwner => "Assign owner",
            Self::RequestUpdate => "Request update",
            Self::PostInternalNote => "Post internal playbook note",
            Self::GenerateCustomerDraft => "Generate customer draft",
            Self::Escalate => "Escalate",
        }
    }
}

/// Outcome of a single plan step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Done,
    Skipped,
    Failed,
}

/// Result of one executed, skipped or failed action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepResult {
    pub key: String,
    pub label: String,
    pub status: StepStatus,
    pub message: String,
}

impl StepResult {
    #[must_use]
    pub fn done(action: Action, message: impl Into<String>) -> Self {
        Self::new(action, StepStatus::Done, message)
    }

    #[must_use]
    pub fn skipped(action: Action, message: impl Into<String>) -> Self {
        Self::new(action, StepStatus::Skipped, message)
    }

    #[must_use]
    pub fn failed(action: Action, message: impl Into<String>) -> Self {
        Self::new(action, StepStatus::Failed, message)
    }

    fn new(action: Action, status: StepStatus, message: impl Into<String>) -> Self {
        Self {
            key: action.key().to_string(),
            label: action.label().to_string(),
            status,
            message: message.into(),
        }
    }
}

/// Summary of the decision inputs of a run, for caller display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    /// Owner at the start of the run.
    pub owner: Option<String>,
    pub tier: RiskTier,
    pub reasons: Vec<RiskReason>,
    pub recommended: Vec<Action>,
    pub next_action: Option<Action>,
    pub escalation_label: String,
}

/// Full result of a single-issue run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOutcome {
    pub key: String,
    pub steps: Vec<StepResult>,
    pub draft: String,
    pub outcome: RunSummary,
}

impl RunOutcome {
    /// Number of steps with the given status.
    #[must_use]
    pub fn count(&self, status: StepStatus) -> usize {
        self.steps.iter().filter(|s| s.status == status).count()
    }
}

/// Per-issue entry of a bulk run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkIssueResult {
    pub key: String,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<StepResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregated result of a bulk run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkResult {
    pub total: usize,
    pub ok_count: usize,
    pub failed_count: usize,
    /// Failed steps summed across issues that ran.
    pub failed_steps: usize,
    /// Skipped steps summed across issues that ran.
    pub skipped_steps: usize,
    pub results: Vec<BulkIssueResult>,
}

/// Result of an atomic single-purpose command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CommandResult {
    #[must_use]
    pub const fn ok() -> Self {
        Self {
            ok: true,
            error: None,
        }
    }

    #[must_use]
    pub fn err(error: impl std::fmt::Display) -> Self {
        Self {
            ok: false,
            error: Some(error.to_string()),
        }
    }
}
