//! Single-issue action executor.
//!
//! Runs the recommended plan for one issue against the tracker. The issue
//! snapshot and comment history are read once at the start of a run; later
//! steps decide from that snapshot even if an earlier step changed the issue.
//! Each step is its own failure boundary: a failed write becomes a `failed`
//! step and the remaining steps still run.

pub mod messages;

use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

use crate::adf;
use crate::assess::TriagedIssue;
use crate::config::TriageConfig;
use crate::cooldown::IssueCooldowns;
use crate::error::{TrackerError, TriageError};
use crate::models::{
    Action, Comment, IssueSnapshot, RunOutcome, RunSummary, StepResult, StepStatus,
};
use crate::planner::next_action;
use crate::tracker::IssueTracker;

/// Executes remediation actions for one issue at a time.
pub struct ActionExecutor<'a> {
    tracker: &'a dyn IssueTracker,
    config: &'a TriageConfig,
}

/// Everything a step may consult, fixed for the whole run.
struct RunContext<'r> {
    triaged: &'r TriagedIssue,
    cooldowns: IssueCooldowns,
    actor_id: &'r str,
}

impl<'a> ActionExecutor<'a> {
    #[must_use]
    pub fn new(tracker: &'a dyn IssueTracker, config: &'a TriageConfig) -> Self {
        Self { tracker, config }
    }

    /// Fetch the issue and its history, then run the recommended plan.
    ///
    /// Only missing context or a failed read returns `Err`; nothing is
    /// written in that case.
    #[instrument(skip(self), fields(issue_key = %key))]
    pub async fn run_recommended(
        &self,
        key: &str,
        actor_id: &str,
    ) -> Result<RunOutcome, TriageError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(TriageError::MissingContext("issue key is required".into()));
        }
        if actor_id.trim().is_empty() {
            return Err(TriageError::MissingContext("actor identity is required".into()));
        }

        let issue = self
            .tracker
            .get_issue(key)
            .await
            .map_err(TriageError::TrackerFetch)?;
        let comments = self
            .tracker
            .get_comments(key)
            .await
            .map_err(TriageError::TrackerFetch)?;

        Ok(self.execute(issue, &comments, actor_id, Utc::now()).await)
    }

    /// Run the plan for an already-fetched snapshot and history.
    pub async fn execute(
        &self,
        issue: IssueSnapshot,
        comments: &[Comment],
        actor_id: &str,
        now: DateTime<Utc>,
    ) -> RunOutcome {
        let triaged = TriagedIssue::assess(issue, self.config, now);
        let ctx = RunContext {
            triaged: &triaged,
            cooldowns: IssueCooldowns::from_history(comments, self.config, now),
            actor_id,
        };

        info!(
            issue_key = %triaged.issue.key,
            tier = %triaged.tier(),
            planned = triaged.plan.len(),
            "Running recommended actions"
        );

        let mut steps = Vec::with_capacity(triaged.plan.len());
        for action in &triaged.plan {
            let step = self.run_step(*action, &ctx).await;
            match step.status {
                StepStatus::Failed => warn!(
                    issue_key = %triaged.issue.key,
                    action = action.key(),
                    message = %step.message,
                    "Step failed"
                ),
                status => info!(
                    issue_key = %triaged.issue.key,
                    action = action.key(),
                    status = ?status,
                    "Step finished"
                ),
            }
            steps.push(step);
        }

        let draft = messages::customer_draft(&triaged, self.config);

        let outcome = RunOutcome {
            key: triaged.issue.key.clone(),
            draft,
            outcome: RunSummary {
                owner: triaged
                    .issue
                    .assignee
                    .as_ref()
                    .map(|a| a.label().to_string()),
                tier: triaged.assessment.tier,
                reasons: triaged.assessment.reasons.clone(),
                recommended: triaged.plan.clone(),
                next_action: next_action(&triaged.plan),
                escalation_label: self.config.escalation_label.clone(),
            },
            steps,
        };

        info!(
            issue_key = %outcome.key,
            done = outcome.count(StepStatus::Done),
            skipped = outcome.count(StepStatus::Skipped),
            failed = outcome.count(StepStatus::Failed),
            "Run complete"
        );
        outcome
    }

    async fn run_step(&self, action: Action, ctx: &RunContext<'_>) -> StepResult {
        let triaged = ctx.triaged;
        match action {
            Action::AssignOwner => {
                if let Some(assignee) = &triaged.issue.assignee {
                    return StepResult::skipped(
                        action,
                        format!("Already assigned to {}", assignee.label()),
                    );
                }
                match self.assign(&triaged.issue.key, ctx.actor_id).await {
                    Ok(()) => StepResult::done(action, format!("Assigned to {}", ctx.actor_id)),
                    Err(e) => StepResult::failed(action, format!("Assignment failed: {e}")),
                }
            }
            Action::RequestUpdate => {
                if ctx.cooldowns.request_update.is_active() {
                    return cooldown_skip(action, ctx.cooldowns.request_update.remaining_hours);
                }
                match self.post_request_update(triaged).await {
                    Ok(()) => StepResult::done(action, "Posted request for update"),
                    Err(e) => StepResult::failed(
                        action,
                        format!("Failed to post request for update: {e}"),
                    ),
                }
            }
            Action::PostInternalNote => {
                if ctx.cooldowns.playbook_note.is_active() {
                    return cooldown_skip(action, ctx.cooldowns.playbook_note.remaining_hours);
                }
                match self.post_playbook_note(triaged).await {
                    Ok(()) => StepResult::done(action, "Posted internal playbook note"),
                    Err(e) => {
                        StepResult::failed(action, format!("Failed to post playbook note: {e}"))
                    }
                }
            }
            Action::GenerateCustomerDraft => {
                let draft = messages::customer_draft(triaged, self.config);
                StepResult::done(
                    action,
                    format!("Customer draft generated ({} characters)", draft.chars().count()),
                )
            }
            Action::Escalate => {
                let label = &self.config.escalation_label;
                if triaged.issue.has_label(label) {
                    return StepResult::skipped(action, format!("Label {label} already present"));
                }
                if let Err(e) = self.add_escalation_label(&triaged.issue.key).await {
                    return StepResult::failed(action, format!("Failed to apply label {label}: {e}"));
                }
                match self.post_escalation(triaged).await {
                    Ok(()) => StepResult::done(
                        action,
                        format!("Applied {label} and posted escalation note"),
                    ),
                    Err(e) => StepResult::failed(
                        action,
                        format!("Applied {label} but failed to post escalation note: {e}"),
                    ),
                }
            }
        }
    }

    // =========================================================================
    // Write primitives (shared with the atomic commands)
    // =========================================================================

    /// Assign the issue to the actor.
    pub async fn assign(&self, key: &str, actor_id: &str) -> Result<(), TrackerError> {
        self.tracker.set_assignee(key, actor_id).await
    }

    /// Post the audit-marked request-update comment.
    pub async fn post_request_update(&self, triaged: &TriagedIssue) -> Result<(), TrackerError> {
        let text = messages::request_update(triaged, self.config);
        self.tracker
            .add_comment(&triaged.issue.key, &adf::document(&text))
            .await
    }

    /// Post the audit-marked internal playbook note.
    pub async fn post_playbook_note(&self, triaged: &TriagedIssue) -> Result<(), TrackerError> {
        let text = messages::playbook_note(triaged, self.config);
        self.tracker
            .add_comment(&triaged.issue.key, &adf::document(&text))
            .await
    }

    /// Apply the escalation label.
    pub async fn add_escalation_label(&self, key: &str) -> Result<(), TrackerError> {
        self.tracker
            .add_label(key, &self.config.escalation_label)
            .await
    }

    /// Post the audit-marked escalation comment.
    pub async fn post_escalation(&self, triaged: &TriagedIssue) -> Result<(), TrackerError> {
        let text = messages::escalation(triaged, self.config);
        self.tracker
            .add_comment(&triaged.issue.key, &adf::document(&text))
            .await
    }
}

fn cooldown_skip(action: Action, remaining_hours: f64) -> StepResult {
    StepResult::skipped(
        action,
        format!("Cooldown active, {remaining_hours:.1}h remaining"),
    )
}
