//! Per-issue triage pipeline: signals, risk and plan computed together.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::TriageConfig;
use crate::models::{Action, IssueSnapshot, RiskTier, Signals};
use crate::planner::{next_action, recommend};
use crate::risk::{classify, RiskAssessment, RiskReason};
use crate::signals::extract_signals;

/// An issue with everything derived from its current snapshot.
#[derive(Debug, Clone)]
pub struct TriagedIssue {
    pub issue: IssueSnapshot,
    pub signals: Signals,
    pub assessment: RiskAssessment,
    pub plan: Vec<Action>,
}

impl TriagedIssue {
    /// Run signal extraction, classification and planning for one snapshot.
    #[must_use]
    pub fn assess(issue: IssueSnapshot, config: &TriageConfig, now: DateTime<Utc>) -> Self {
        let signals = extract_signals(&issue, config, now);
        let assessment = classify(&signals, config);
        let plan = recommend(&signals, config);
        Self {
            issue,
            signals,
            assessment,
            plan,
        }
    }

    #[must_use]
    pub fn tier(&self) -> RiskTier {
        self.assessment.tier
    }

    /// Whether the first-response SLA is at or below the high threshold.
    #[must_use]
    pub fn is_sla_critical(&self, config: &TriageConfig) -> bool {
        self.signals
            .first_response_remaining_hours
            .is_some_and(|h| h <= config.high_sla_hours)
    }

    /// Flat row for listings.
    #[must_use]
    pub fn to_row(&self) -> IssueAssessment {
        IssueAssessment {
            key: self.issue.key.clone(),
            summary: self.issue.summary.clone(),
            status: self.issue.status.clone(),
            assignee: self.issue.assignee.as_ref().map(|a| a.label().to_string()),
            stale_hours: self.signals.stale_hours,
            sla_remaining_hours: self.signals.first_response_remaining_hours,
            tier: self.assessment.tier,
            reasons: self.assessment.reasons.clone(),
            recommended: self.plan.clone(),
            next_action: next_action(&self.plan),
        }
    }
}

/// Listing row for one assessed issue.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueAssessment {
    pub key: String,
    pub summary: String,
    pub status: String,
    pub assignee: Option<String>,
    pub stale_hours: Option<f64>,
    pub sla_remaining_hours: Option<f64>,
    pub tier: RiskTier,
    pub reasons: Vec<RiskReason>,
    pub recommended: Vec<Action>,
    pub next_action: Option<Action>,
}
