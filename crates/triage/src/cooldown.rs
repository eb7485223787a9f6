//! Cooldown tracking derived from audit-marked comment history.
//!
//! There is no stored state: whether an action may run again is recomputed
//! from the most recent comment carrying the action's marker. Keeps the
//! engine compatible with any audit history already on the tracker.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::adf;
use crate::config::TriageConfig;
use crate::models::Comment;
use crate::signals::stale_hours;

/// Cooldown state for one action type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CooldownState {
    /// A marked comment exists in the history.
    pub posted: bool,
    /// Age of the most recent marked comment.
    pub age_hours: Option<f64>,
    pub window_hours: f64,
    /// Zero means the action may run now.
    pub remaining_hours: f64,
}

impl CooldownState {
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.remaining_hours > 0.0
    }
}

/// Cooldowns for the comment-posting actions of one issue.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueCooldowns {
    pub request_update: CooldownState,
    pub playbook_note: CooldownState,
}

impl IssueCooldowns {
    /// Compute both cooldowns from one history snapshot.
    #[must_use]
    pub fn from_history(comments: &[Comment], config: &TriageConfig, now: DateTime<Utc>) -> Self {
        Self {
            request_update: cooldown_state(
                comments,
                &config.request_update_marker,
                config.request_update_window_hours,
                now,
            ),
            playbook_note: cooldown_state(
                comments,
                &config.playbook_note_marker,
                config.playbook_note_window_hours,
                now,
            ),
        }
    }
}

/// Compute the cooldown for `marker` over `comments`.
///
/// The youngest matching comment wins. Comments without a creation timestamp
/// cannot be aged and are ignored.
#[must_use]
pub fn cooldown_state(
    comments: &[Comment],
    marker: &str,
    window_hours: f64,
    now: DateTime<Utc>,
) -> CooldownState {
    let min_age = comments
        .iter()
        .filter(|comment| adf::plain_text(&comment.body).contains(marker))
        .filter_map(|comment| comment.created)
        .map(|created| stale_hours(created, now))
        .min_by(f64::total_cmp);

    match min_age {
        Some(age) => CooldownState {
            posted: true,
            age_hours: Some(age),
            window_hours,
            remaining_hours: (window_hours - age).max(0.0),
        },
        None => CooldownState {
            posted: false,
            age_hours: None,
            window_hours,
            remaining_hours: 0.0,
        },
    }
}
