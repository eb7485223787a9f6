//! Triage CLI
//!
//! Lists at-risk support issues, runs recommended remediation plans and
//! serves the same operations over HTTP.

use std::fmt::Write as _;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use triage::{
    server, AtRiskReport, BulkResult, BulkScope, CommandResult, IssueCooldowns, JiraClient,
    RunOutcome, TrackerConfig, TriageConfig, TriageService,
};

/// Support queue triage: risk tiers, remediation plans and tracker actions
#[derive(Parser)]
#[command(name = "triage")]
#[command(about = "Support queue triage: risk tiers, remediation plans and tracker actions")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a JSON triage config (thresholds, windows, markers)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Project key used as scope for listings and bulk runs
    #[arg(long, env = "JIRA_PROJECT_KEY", global = true)]
    project: Option<String>,

    /// Account id of the acting user
    #[arg(long, env = "TRIAGE_ACTOR_ID", global = true)]
    actor: Option<String>,

    /// Output format (json or text)
    #[arg(long, default_value = "json", global = true)]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Json,
    Text,
}

#[derive(Subcommand)]
enum Commands {
    /// List open issues in the project with tier, reasons and next action
    AtRisk,
    /// Show request-update and playbook-note cooldowns for an issue
    Cooldowns {
        /// Issue key (e.g., SUP-42)
        key: String,
    },
    /// Run the recommended plan for one issue
    Run {
        /// Issue key (e.g., SUP-42)
        key: String,
    },
    /// Run recommended plans across the project
    Bulk {
        /// Which issues to process
        #[arg(long, value_enum, default_value = "high-risk")]
        scope: BulkScope,
    },
    /// Assign the issue to the acting user
    AssignToMe { key: String },
    /// Post a request-update comment (ignores cooldown)
    RequestUpdate { key: String },
    /// Post the internal playbook note (ignores cooldown)
    PlaybookNote { key: String },
    /// Apply the escalation label and post an escalation comment
    Escalate { key: String },
    /// Serve the triage API over HTTP
    Serve {
        /// Port to listen on
        #[arg(long, env = "TRIAGE_PORT", default_value = "8080")]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json)?;

    let config = match &cli.config {
        Some(path) => TriageConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => {
            let config = TriageConfig::from_env();
            config.validate().context("Invalid triage configuration")?;
            config
        }
    };

    let tracker_config = TrackerConfig::from_env();
    if tracker_config.base_url.is_empty() {
        bail!("JIRA_BASE_URL is not set");
    }
    let default_project = cli
        .project
        .clone()
        .or_else(|| tracker_config.project_key.clone());

    let tracker = JiraClient::new(tracker_config).context("Failed to create Jira client")?;
    let service = TriageService::new(Arc::new(tracker), config);

    let project = default_project.clone().unwrap_or_default();
    let actor = cli.actor.clone().unwrap_or_default();

    match cli.command {
        Commands::AtRisk => {
            let report = service.get_at_risk_issues(&project).await?;
            emit(cli.format, &report, render_report)?;
        }
        Commands::Cooldowns { key } => {
            let cooldowns = service.get_issue_cooldowns(&key).await?;
            emit(cli.format, &cooldowns, render_cooldowns)?;
        }
        Commands::Run { key } => {
            let outcome = service.run_recommended(&key, &actor).await?;
            emit(cli.format, &outcome, render_outcome)?;
        }
        Commands::Bulk { scope } => {
            let result = service.run_bulk_recommended(&project, scope, &actor).await?;
            emit(cli.format, &result, render_bulk)?;
        }
        Commands::AssignToMe { key } => {
            finish(service.assign_to_me(&key, &actor).await)?;
        }
        Commands::RequestUpdate { key } => {
            finish(service.request_update(&key, &actor).await)?;
        }
        Commands::PlaybookNote { key } => {
            finish(service.post_playbook_note(&key, &actor).await)?;
        }
        Commands::Escalate { key } => {
            finish(service.escalate(&key, &actor).await)?;
        }
        Commands::Serve { port } => {
            let app = server::build_router(server::AppState {
                service,
                default_project,
            });

            let addr = SocketAddr::from(([0, 0, 0, 0], port));
            let listener = TcpListener::bind(addr)
                .await
                .context("Failed to bind to address")?;

            info!(port, "Triage service listening");
            axum::serve(listener, app).await.context("Server error")?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool, json: bool) -> Result<()> {
    let level = if verbose { "triage=debug" } else { "triage=info" };
    let filter = EnvFilter::from_default_env().add_directive(level.parse()?);

    // Logs go to stderr; stdout carries command output.
    if json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .init();
    }
    Ok(())
}

fn emit<T: Serialize>(format: OutputFormat, value: &T, render: fn(&T) -> String) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Text => print!("{}", render(value)),
    }
    Ok(())
}

fn finish(result: CommandResult) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&result)?);
    if let Some(error) = result.error {
        bail!(error);
    }
    Ok(())
}

fn render_report(report: &AtRiskReport) -> String {
    let stats = &report.stats;
    let mut out = format!(
        "{} open: {} high ({} unassigned), {} medium, {} normal, {} SLA-critical\n",
        stats.total, stats.high, stats.unassigned_high, stats.medium, stats.normal, stats.sla_critical
    );
    for row in &report.issues {
        let reasons: Vec<String> = row.reasons.iter().map(ToString::to_string).collect();
        let _ = writeln!(
            out,
            "{:<8} {:<12} {:<24} {}",
            row.tier.as_str(),
            row.key,
            row.next_action.map_or("-", |a| a.label()),
            reasons.join("; ")
        );
    }
    out
}

fn render_outcome(outcome: &RunOutcome) -> String {
    let mut out = format!("{} ({})\n", outcome.key, outcome.outcome.tier);
    for step in &outcome.steps {
        let _ = writeln!(out, "  [{:?}] {}: {}", step.status, step.label, step.message);
    }
    let _ = writeln!(out, "\nCustomer draft:\n{}", outcome.draft);
    out
}

fn render_cooldowns(cooldowns: &IssueCooldowns) -> String {
    let mut out = String::new();
    for (name, state) in [
        ("request-update", &cooldowns.request_update),
        ("playbook-note", &cooldowns.playbook_note),
    ] {
        let _ = match state.age_hours {
            Some(age) if state.is_active() => writeln!(
                out,
                "{name:<16} active, {:.1}h remaining (last posted {age:.1}h ago)",
                state.remaining_hours
            ),
            Some(age) => writeln!(out, "{name:<16} ready (last posted {age:.1}h ago)"),
            None => writeln!(out, "{name:<16} ready (never posted)"),
        };
    }
    out
}

fn render_bulk(result: &BulkResult) -> String {
    let mut out = format!(
        "{} issues: {} ok, {} failed ({} failed steps, {} skipped steps)\n",
        result.total, result.ok_count, result.failed_count, result.failed_steps, result.skipped_steps
    );
    for issue in &result.results {
        let _ = match &issue.error {
            Some(error) => writeln!(out, "  {:<12} failed: {error}", issue.key),
            None => writeln!(out, "  {:<12} ok, {} steps", issue.key, issue.steps.len()),
        };
    }
    out
}
