//! Recommendation planner.
//!
//! Plans are built from signals rather than from the tier, so the list stays
//! stable and explainable on its own. The first element is the "next action".

use crate::config::TriageConfig;
use crate::models::{Action, Signals};

/// Ordered remediation actions for the given signals.
///
/// An empty plan means no intervention is needed.
#[must_use]
pub fn recommend(signals: &Signals, config: &TriageConfig) -> Vec<Action> {
    let mut plan = Vec::new();

    if signals.is_unassigned {
        plan.push(Action::AssignOwner);
    }

    if signals.is_blocked {
        plan.extend([
            Action::RequestUpdate,
            Action::PostInternalNote,
            Action::GenerateCustomerDraft,
        ]);
    }

    if signals
        .first_response_remaining_hours
        .is_some_and(|remaining| remaining <= config.high_sla_hours)
    {
        plan.push(Action::Escalate);
    }

    if !signals.is_blocked && signals.manual_override && plan.is_empty() {
        plan.push(Action::GenerateCustomerDraft);
    }

    plan
}

/// The "next action" hint: the first planned action, if any.
#[must_use]
pub fn next_action(plan: &[Action]) -> Option<Action> {
    plan.first().copied()
}
