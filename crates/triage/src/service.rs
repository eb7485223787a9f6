//! Caller-facing triage operations.
//!
//! Every operation validates its context (project scope, actor) before any
//! tracker call. Multi-step operations never return write failures as
//! errors; atomic commands report them as `{ ok: false, error }`.

use std::cmp::Ordering;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::assess::{IssueAssessment, TriagedIssue};
use crate::bulk::{run_bulk, BulkScope};
use crate::config::TriageConfig;
use crate::cooldown::IssueCooldowns;
use crate::error::TriageError;
use crate::executor::ActionExecutor;
use crate::models::{BulkResult, CommandResult, RiskTier, RunOutcome};
use crate::tracker::{project_scope_query, IssueTracker};

/// Counts over an at-risk listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskStats {
    pub total: usize,
    pub high: usize,
    pub medium: usize,
    pub normal: usize,
    /// HIGH issues without an owner.
    pub unassigned_high: usize,
    /// Issues whose first response is due within the high SLA threshold.
    pub sla_critical: usize,
}

/// Result of [`TriageService::get_at_risk_issues`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AtRiskReport {
    pub issues: Vec<IssueAssessment>,
    pub stats: RiskStats,
}

/// Triage operations bound to one tracker and one configuration.
#[derive(Clone)]
pub struct TriageService {
    tracker: Arc<dyn IssueTracker>,
    config: Arc<TriageConfig>,
}

impl TriageService {
    #[must_use]
    pub fn new(tracker: Arc<dyn IssueTracker>, config: TriageConfig) -> Self {
        Self {
            tracker,
            config: Arc::new(config),
        }
    }

    fn executor(&self) -> ActionExecutor<'_> {
        ActionExecutor::new(self.tracker.as_ref(), &self.config)
    }

    /// Assess every open issue in a project, most urgent first.
    #[instrument(skip(self))]
    pub async fn get_at_risk_issues(&self, project: &str) -> Result<AtRiskReport, TriageError> {
        let project = require("project scope", project)?;
        let issues = self
            .tracker
            .search_issues(&project_scope_query(project), self.config.search_limit)
            .await
            .map_err(TriageError::TrackerFetch)?;

        let now = Utc::now();
        let mut triaged: Vec<TriagedIssue> = issues
            .into_iter()
            .map(|issue| TriagedIssue::assess(issue, &self.config, now))
            .collect();
        triaged.sort_by(by_urgency);

        let mut stats = RiskStats {
            total: triaged.len(),
            ..RiskStats::default()
        };
        for t in &triaged {
            match t.tier() {
                RiskTier::High => {
                    stats.high += 1;
                    if t.signals.is_unassigned {
                        stats.unassigned_high += 1;
                    }
                }
                RiskTier::Medium => stats.medium += 1,
                RiskTier::Normal => stats.normal += 1,
            }
            if t.is_sla_critical(&self.config) {
                stats.sla_critical += 1;
            }
        }

        info!(
            project,
            total = stats.total,
            high = stats.high,
            medium = stats.medium,
            "Assessed project issues"
        );

        Ok(AtRiskReport {
            issues: triaged.iter().map(TriagedIssue::to_row).collect(),
            stats,
        })
    }

    /// Current cooldowns for the comment-posting actions of an issue.
    #[instrument(skip(self))]
    pub async fn get_issue_cooldowns(&self, key: &str) -> Result<IssueCooldowns, TriageError> {
        let key = require("issue key", key)?;
        let comments = self
            .tracker
            .get_comments(key)
            .await
            .map_err(TriageError::TrackerFetch)?;
        Ok(IssueCooldowns::from_history(&comments, &self.config, Utc::now()))
    }

    /// Run the recommended plan for one issue.
    pub async fn run_recommended(
        &self,
        key: &str,
        actor_id: &str,
    ) -> Result<RunOutcome, TriageError> {
        self.executor().run_recommended(key, actor_id).await
    }

    /// Run the recommended plan across a project.
    pub async fn run_bulk_recommended(
        &self,
        project: &str,
        scope: BulkScope,
        actor_id: &str,
    ) -> Result<BulkResult, TriageError> {
        let project = require("project scope", project)?;
        require("actor identity", actor_id)?;
        run_bulk(
            self.tracker.as_ref(),
            &self.config,
            &project_scope_query(project),
            scope,
            actor_id,
        )
        .await
    }

    // =========================================================================
    // Atomic commands
    // =========================================================================

    /// Assign the issue to the acting user.
    #[instrument(skip(self))]
    pub async fn assign_to_me(&self, key: &str, actor_id: &str) -> CommandResult {
        let (key, actor_id) = match require_pair(key, actor_id) {
            Ok(pair) => pair,
            Err(e) => return CommandResult::err(e),
        };
        command_result(
            "assign_to_me",
            key,
            self.executor().assign(key, actor_id).await,
        )
    }

    /// Post a request-update comment, regardless of cooldown.
    #[instrument(skip(self))]
    pub async fn request_update(&self, key: &str, actor_id: &str) -> CommandResult {
        let triaged = match self.load(key, actor_id).await {
            Ok(t) => t,
            Err(e) => return CommandResult::err(e),
        };
        command_result(
            "request_update",
            &triaged.issue.key,
            self.executor().post_request_update(&triaged).await,
        )
    }

    /// Post the internal playbook note, regardless of cooldown.
    #[instrument(skip(self))]
    pub async fn post_playbook_note(&self, key: &str, actor_id: &str) -> CommandResult {
        let triaged = match self.load(key, actor_id).await {
            Ok(t) => t,
            Err(e) => return CommandResult::err(e),
        };
        command_result(
            "post_playbook_note",
            &triaged.issue.key,
            self.executor().post_playbook_note(&triaged).await,
        )
    }

    /// Apply the escalation label (if missing) and post the escalation comment.
    #[instrument(skip(self))]
    pub async fn escalate(&self, key: &str, actor_id: &str) -> CommandResult {
        let triaged = match self.load(key, actor_id).await {
            Ok(t) => t,
            Err(e) => return CommandResult::err(e),
        };
        let executor = self.executor();
        let key = triaged.issue.key.as_str();

        if !triaged.issue.has_label(&self.config.escalation_label) {
            if let Err(e) = executor.add_escalation_label(key).await {
                return command_result("escalate", key, Err(e));
            }
        }
        command_result("escalate", key, executor.post_escalation(&triaged).await)
    }

    async fn load(&self, key: &str, actor_id: &str) -> Result<TriagedIssue, TriageError> {
        let (key, _) = require_pair(key, actor_id)?;
        let issue = self
            .tracker
            .get_issue(key)
            .await
            .map_err(TriageError::TrackerFetch)?;
        Ok(TriagedIssue::assess(issue, &self.config, Utc::now()))
    }
}

fn require<'s>(what: &str, value: &'s str) -> Result<&'s str, TriageError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TriageError::MissingContext(format!("{what} is required")));
    }
    Ok(trimmed)
}

fn require_pair<'s>(key: &'s str, actor_id: &'s str) -> Result<(&'s str, &'s str), TriageError> {
    Ok((require("issue key", key)?, require("actor identity", actor_id)?))
}

fn command_result(
    command: &'static str,
    key: &str,
    result: Result<(), crate::error::TrackerError>,
) -> CommandResult {
    match result {
        Ok(()) => {
            info!(command, issue_key = %key, "Command succeeded");
            CommandResult::ok()
        }
        Err(e) => {
            warn!(command, issue_key = %key, error = %e, "Command failed");
            CommandResult::err(TriageError::TrackerWrite(e))
        }
    }
}

/// HIGH before MEDIUM before NORMAL; staler first within a tier.
fn by_urgency(a: &TriagedIssue, b: &TriagedIssue) -> Ordering {
    let stale = |t: &TriagedIssue| t.signals.stale_hours.unwrap_or(-1.0);
    b.tier()
        .cmp(&a.tier())
        .then_with(|| stale(b).total_cmp(&stale(a)))
}
