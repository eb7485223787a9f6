//! Signal extraction from issue snapshots.

use chrono::{DateTime, Utc};

use crate::config::TriageConfig;
use crate::models::{IssueSnapshot, Signals};
use crate::sla;

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Derive signals from a snapshot at the given instant.
///
/// Never fails: a missing timestamp or an unparseable SLA payload simply
/// leaves the corresponding signal as `None`.
#[must_use]
pub fn extract_signals(issue: &IssueSnapshot, config: &TriageConfig, now: DateTime<Utc>) -> Signals {
    Signals {
        stale_hours: issue.updated.map(|updated| stale_hours(updated, now)),
        is_blocked: issue.status == config.blocked_status,
        is_unassigned: issue.assignee.is_none(),
        manual_override: has_override_marker(&issue.summary, &config.override_marker),
        first_response_remaining_hours: sla::first_response_remaining_hours(issue.sla.as_ref()),
    }
}

/// Hours elapsed since `updated`, clamped at zero for clock skew.
#[must_use]
pub fn stale_hours(updated: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let elapsed = now.signed_duration_since(updated);
    (elapsed.num_milliseconds() as f64 / 1000.0 / SECONDS_PER_HOUR).max(0.0)
}

fn has_override_marker(summary: &str, marker: &str) -> bool {
    !marker.is_empty() && summary.to_lowercase().contains(&marker.to_lowercase())
}
