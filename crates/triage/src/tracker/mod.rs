//! Issue tracker abstraction.

pub mod jira;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::TrackerError;
use crate::models::{Comment, IssueSnapshot};

pub use jira::JiraClient;

/// Operations the engine consumes from an issue tracker.
///
/// All calls are fallible and are never retried by the engine. Writes that
/// succeed with an empty body must return `Ok(())`.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Search issues with a tracker query, returning minimal projections.
    async fn search_issues(&self, query: &str, limit: u32)
        -> Result<Vec<IssueSnapshot>, TrackerError>;

    /// Fetch a single issue projection.
    async fn get_issue(&self, key: &str) -> Result<IssueSnapshot, TrackerError>;

    /// Fetch comments ordered by creation time.
    async fn get_comments(&self, key: &str) -> Result<Vec<Comment>, TrackerError>;

    /// Append a rich-text comment.
    async fn add_comment(&self, key: &str, body: &Value) -> Result<(), TrackerError>;

    /// Assign the issue to an account.
    async fn set_assignee(&self, key: &str, account_id: &str) -> Result<(), TrackerError>;

    /// Add a label to the issue.
    async fn add_label(&self, key: &str, label: &str) -> Result<(), TrackerError>;
}

/// Default scope query for a project: open issues, least recently updated first.
#[must_use]
pub fn project_scope_query(project_key: &str) -> String {
    let escaped = project_key.replace('\\', "\\\\").replace('"', "\\\"");
    format!("project = \"{escaped}\" AND statusCategory != Done ORDER BY updated ASC")
}
