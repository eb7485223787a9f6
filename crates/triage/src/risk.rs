//! Risk classification.
//!
//! The tier is a pure function of the current signals. Precedence, highest
//! first: manual override, SLA-high, unassigned (while blocked), stale,
//! SLA-medium floor. Every escalation except the override applies only while
//! the issue is blocked on support; outside that state the tier stays
//! NORMAL unless the override marker is present.
//!
//! Reasons are collected independently of the tier: each reason is present
//! exactly when its triggering condition holds, in a fixed order
//! (override, blocked, unassigned, stale, SLA).

use serde::{Serialize, Serializer};

use crate::config::TriageConfig;
use crate::models::{RiskTier, Signals};

/// Human-readable explanation for a tier.
#[derive(Debug, Clone, PartialEq)]
pub enum RiskReason {
    ManualOverride,
    Blocked { status: String },
    Unassigned,
    StaleHigh { threshold_hours: f64 },
    StaleMedium { threshold_hours: f64 },
    SlaHigh { threshold_hours: f64 },
    SlaMedium { threshold_hours: f64 },
}

impl RiskReason {
    /// Whether this reason comes from staleness.
    #[must_use]
    pub const fn is_stale(&self) -> bool {
        matches!(self, Self::StaleHigh { .. } | Self::StaleMedium { .. })
    }
}

impl std::fmt::Display for RiskReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ManualOverride => f.write_str("manual override"),
            Self::Blocked { status } => write!(f, "status is {status}"),
            Self::Unassigned => f.write_str("unassigned"),
            Self::StaleHigh { threshold_hours } | Self::StaleMedium { threshold_hours } => {
                write!(f, "stale {threshold_hours}h+")
            }
            Self::SlaHigh { threshold_hours } | Self::SlaMedium { threshold_hours } => {
                write!(f, "first response due within {threshold_hours}h")
            }
        }
    }
}

impl Serialize for RiskReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Tier plus the reasons that explain it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAssessment {
    pub tier: RiskTier,
    pub reasons: Vec<RiskReason>,
}

impl RiskAssessment {
    /// Reasons rendered as display strings.
    #[must_use]
    pub fn reason_strings(&self) -> Vec<String> {
        self.reasons.iter().map(ToString::to_string).collect()
    }
}

/// Classify signals into a tier with reasons.
#[must_use]
pub fn classify(signals: &Signals, config: &TriageConfig) -> RiskAssessment {
    RiskAssessment {
        tier: tier(signals, config),
        reasons: reasons(signals, config),
    }
}

fn tier(signals: &Signals, config: &TriageConfig) -> RiskTier {
    let mut tier = RiskTier::Normal;

    if signals.is_blocked {
        tier = RiskTier::Medium;

        if let Some(stale) = signals.stale_hours {
            if stale >= config.high_stale_hours {
                tier = RiskTier::High;
            } else if stale >= config.medium_stale_hours {
                tier = tier.max(RiskTier::Medium);
            }
        }

        if signals.is_unassigned {
            tier = RiskTier::High;
        }

        if let Some(remaining) = signals.first_response_remaining_hours {
            if remaining <= config.high_sla_hours {
                tier = RiskTier::High;
            } else if remaining <= config.medium_sla_hours {
                tier = tier.max(RiskTier::Medium);
            }
        }
    }

    if signals.manual_override {
        tier = RiskTier::High;
    }

    tier
}

fn reasons(signals: &Signals, config: &TriageConfig) -> Vec<RiskReason> {
    let mut reasons = Vec::new();

    if signals.manual_override {
        push_unique(&mut reasons, RiskReason::ManualOverride);
    }
    if signals.is_blocked {
        push_unique(
            &mut reasons,
            RiskReason::Blocked {
                status: config.blocked_status.clone(),
            },
        );
    }
    if signals.is_unassigned {
        push_unique(&mut reasons, RiskReason::Unassigned);
    }
    if let Some(stale) = signals.stale_hours {
        if stale >= config.high_stale_hours {
            push_unique(
                &mut reasons,
                RiskReason::StaleHigh {
                    threshold_hours: config.high_stale_hours,
                },
            );
        } else if stale >= config.medium_stale_hours {
            push_unique(
                &mut reasons,
                RiskReason::StaleMedium {
                    threshold_hours: config.medium_stale_hours,
                },
            );
        }
    }
    if let Some(remaining) = signals.first_response_remaining_hours {
        if remaining <= config.high_sla_hours {
            push_unique(
                &mut reasons,
                RiskReason::SlaHigh {
                    threshold_hours: config.high_sla_hours,
                },
            );
        } else if remaining <= config.medium_sla_hours {
            push_unique(
                &mut reasons,
                RiskReason::SlaMedium {
                    threshold_hours: config.medium_sla_hours,
                },
            );
        }
    }

    reasons
}

fn push_unique(reasons: &mut Vec<RiskReason>, reason: RiskReason) {
    if !reasons.contains(&reason) {
        reasons.push(reason);
    }
}
