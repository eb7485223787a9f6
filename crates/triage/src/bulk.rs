//! Bulk orchestration across the issues in a scope.
//!
//! Issues are processed strictly one at a time. Each issue is its own
//! failure boundary: an error while running one issue is recorded against
//! that issue and the batch carries on.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::assess::TriagedIssue;
use crate::config::TriageConfig;
use crate::error::TriageError;
use crate::executor::ActionExecutor;
use crate::models::{BulkIssueResult, BulkResult, RiskTier, StepStatus};
use crate::tracker::IssueTracker;

/// Which issues a bulk run targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum BulkScope {
    /// Only issues currently classified HIGH.
    #[default]
    HighRisk,
    /// Every issue returned by the scope query.
    All,
}

impl BulkScope {
    fn includes(self, triaged: &TriagedIssue) -> bool {
        match self {
            Self::HighRisk => triaged.tier() == RiskTier::High,
            Self::All => true,
        }
    }
}

/// Run the recommended plan for every issue matched by `query` and `scope`.
///
/// Returns `Err` only when the scope cannot be fetched or context is
/// missing; per-issue failures are reported inside the result.
#[instrument(skip(tracker, config))]
pub async fn run_bulk(
    tracker: &dyn IssueTracker,
    config: &TriageConfig,
    query: &str,
    scope: BulkScope,
    actor_id: &str,
) -> Result<BulkResult, TriageError> {
    if actor_id.trim().is_empty() {
        return Err(TriageError::MissingContext("actor identity is required".into()));
    }

    let issues = tracker
        .search_issues(query, config.search_limit)
        .await
        .map_err(TriageError::TrackerFetch)?;

    let now = Utc::now();
    let targets: Vec<String> = issues
        .into_iter()
        .map(|issue| TriagedIssue::assess(issue, config, now))
        .filter(|triaged| scope.includes(triaged))
        .map(|triaged| triaged.issue.key)
        .collect();

    info!(targets = targets.len(), "Starting bulk run");

    let executor = ActionExecutor::new(tracker, config);
    let mut result = BulkResult {
        total: targets.len(),
        ..BulkResult::default()
    };

    for key in targets {
        match executor.run_recommended(&key, actor_id).await {
            Ok(run) => {
                result.ok_count += 1;
                result.failed_steps += run.count(StepStatus::Failed);
                result.skipped_steps += run.count(StepStatus::Skipped);
                result.results.push(BulkIssueResult {
                    key,
                    ok: true,
                    steps: run.steps,
                    draft: Some(run.draft),
                    error: None,
                });
            }
            Err(e) => {
                warn!(issue_key = %key, error = %e, "Issue run failed");
                result.failed_count += 1;
                result.results.push(BulkIssueResult {
                    key,
                    ok: false,
                    steps: Vec::new(),
                    draft: None,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    info!(
        total = result.total,
        ok = result.ok_count,
        failed = result.failed_count,
        failed_steps = result.failed_steps,
        skipped_steps = result.skipped_steps,
        "Bulk run complete"
    );
    Ok(result)
}
