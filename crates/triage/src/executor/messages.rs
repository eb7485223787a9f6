//! Plain-text bodies for audit comments and the customer draft.
//!
//! Every audit comment starts with its action's marker so the cooldown
//! tracker (and a human reading the history) can find it again.

use std::fmt::Write as _;

use crate::assess::TriagedIssue;
use crate::config::TriageConfig;
use crate::models::Action;

/// Comment asking the owning team for a status update.
#[must_use]
pub fn request_update(triaged: &TriagedIssue, config: &TriageConfig) -> String {
    let issue = &triaged.issue;
    let mut text = format!(
        "{} Update requested for {}: \"{}\"",
        config.request_update_marker, issue.key, issue.summary
    );
    if let Some(stale) = triaged.signals.stale_hours {
        let _ = write!(text, "\nNo update for {stale:.0}h while in \"{}\".", issue.status);
    }
    text.push_str("\nPlease post the current status and the next step for the customer.");
    text
}

/// Internal note summarising the triage outcome and the plan.
#[must_use]
pub fn playbook_note(triaged: &TriagedIssue, config: &TriageConfig) -> String {
    let mut text = format!(
        "{} Triage playbook for {}\nRisk tier: {}",
        config.playbook_note_marker, triaged.issue.key, triaged.assessment.tier
    );

    if !triaged.assessment.reasons.is_empty() {
        let _ = write!(
            text,
            "\nReasons: {}",
            triaged.assessment.reason_strings().join("; ")
        );
    }

    if !triaged.plan.is_empty() {
        let steps: Vec<&str> = triaged.plan.iter().map(Action::label).collect();
        let _ = write!(text, "\nPlan: {}", steps.join(" -> "));
    }

    if let Some(remaining) = triaged.signals.first_response_remaining_hours {
        let _ = write!(text, "\nFirst response due in {remaining:.1}h.");
    }
    text
}

/// Comment posted alongside the escalation label.
#[must_use]
pub fn escalation(triaged: &TriagedIssue, config: &TriageConfig) -> String {
    let mut text = format!(
        "{} Escalated {} (tier {}), label \"{}\" applied.",
        config.escalation_marker,
        triaged.issue.key,
        triaged.assessment.tier,
        config.escalation_label
    );
    if !triaged.assessment.reasons.is_empty() {
        let _ = write!(
            text,
            "\nReasons: {}",
            triaged.assessment.reason_strings().join("; ")
        );
    }
    text
}

/// Customer-facing draft. Never posted by the engine.
#[must_use]
pub fn customer_draft(triaged: &TriagedIssue, config: &TriageConfig) -> String {
    let issue = &triaged.issue;
    let reasons = &triaged.assessment.reasons;

    let doing_now = if triaged.signals.is_unassigned {
        "We are assigning a dedicated owner to your request right now."
    } else if triaged.is_sla_critical(config) {
        "We are prioritising a first response to your request."
    } else if reasons.iter().any(|r| r.is_stale()) {
        "We are following up internally on the outstanding update for your request."
    } else {
        "We are reviewing the latest details of your request."
    };

    let mut text = String::from("Hi,\n\n");
    let _ = writeln!(
        text,
        "Thank you for your patience with {} (\"{}\").",
        issue.key, issue.summary
    );
    let _ = writeln!(text, "{doing_now}");
    text.push_str("\nWe will get back to you with an update as soon as we have more information.\n");
    text
}
