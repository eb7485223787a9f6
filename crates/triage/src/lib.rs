//! Support queue triage engine.
//!
//! This crate provides:
//! - Signal extraction from issue snapshots (staleness, first-response SLA)
//! - A pure risk classifier producing a tier and human-readable reasons
//! - A recommendation planner deriving an ordered remediation plan
//! - Cooldown tracking reconstructed from audit-marked comment history
//! - An action executor that runs a plan against the issue tracker idempotently
//! - A bulk orchestrator with per-issue failure isolation
//! - A Jira REST client, an HTTP service and a CLI on top of the engine
//!
//! # Example
//!
//! ```no_run
//! use triage::{JiraClient, TrackerConfig, TriageConfig, TriageService};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let tracker = JiraClient::new(TrackerConfig::from_env())?;
//! let service = TriageService::new(std::sync::Arc::new(tracker), TriageConfig::from_env());
//! let report = service.get_at_risk_issues("SUP").await?;
//! println!("{} high-risk issues", report.stats.high);
//! # Ok(())
//! # }
//! ```

pub mod adf;
pub mod assess;
pub mod bulk;
pub mod config;
pub mod cooldown;
pub mod error;
pub mod executor;
pub mod models;
pub mod planner;
pub mod risk;
pub mod server;
pub mod service;
pub mod signals;
pub mod sla;
pub mod tracker;

pub use assess::{IssueAssessment, TriagedIssue};
pub use bulk::{run_bulk, BulkScope};
pub use config::{TrackerConfig, TriageConfig};
pub use cooldown::{cooldown_state, CooldownState, IssueCooldowns};
pub use error::{TrackerError, TriageError};
pub use executor::ActionExecutor;
pub use models::*;
pub use planner::recommend;
pub use risk::{classify, RiskAssessment, RiskReason};
pub use server::{build_router, AppState};
pub use service::{AtRiskReport, RiskStats, TriageService};
pub use signals::extract_signals;
pub use tracker::{IssueTracker, JiraClient};
