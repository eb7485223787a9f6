//! Shared fixtures: an in-memory issue tracker that records every write.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::Value;

use triage::adf;
use triage::{Assignee, Comment, IssueSnapshot, IssueTracker, TrackerError};

/// A write the engine issued against the tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Write {
    Comment { key: String, text: String },
    Assign { key: String, account_id: String },
    Label { key: String, label: String },
}

#[derive(Default)]
struct State {
    issues: Vec<IssueSnapshot>,
    comments: HashMap<String, Vec<Comment>>,
    writes: Vec<Write>,
    /// (operation, issue key) pairs that fail. Key "*" matches any issue.
    failures: HashSet<(String, String)>,
    fail_search: bool,
    calls: usize,
}

/// In-memory tracker. Writes mutate the stored issues and comment history,
/// so a second run observes the effects of the first.
#[derive(Default)]
pub struct FakeTracker {
    state: Mutex<State>,
}

impl FakeTracker {
    pub fn new(issues: Vec<IssueSnapshot>) -> Self {
        let tracker = Self::default();
        tracker.state.lock().unwrap().issues = issues;
        tracker
    }

    /// Seed a plain-text comment created `age_hours` ago.
    pub fn with_comment(self, key: &str, text: &str, age_hours: i64) -> Self {
        self.state
            .lock()
            .unwrap()
            .comments
            .entry(key.to_string())
            .or_default()
            .push(Comment {
                id: None,
                created: Some(Utc::now() - Duration::hours(age_hours)),
                body: adf::document(text),
            });
        self
    }

    /// Make `operation` fail for `key` ("*" for every key).
    pub fn failing(self, operation: &str, key: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failures
            .insert((operation.to_string(), key.to_string()));
        self
    }

    pub fn failing_search(self) -> Self {
        self.state.lock().unwrap().fail_search = true;
        self
    }

    pub fn writes(&self) -> Vec<Write> {
        self.state.lock().unwrap().writes.clone()
    }

    pub fn comment_writes(&self, key: &str) -> Vec<String> {
        self.writes()
            .into_iter()
            .filter_map(|w| match w {
                Write::Comment { key: k, text } if k == key => Some(text),
                _ => None,
            })
            .collect()
    }

    /// Total tracker calls, reads included.
    pub fn calls(&self) -> usize {
        self.state.lock().unwrap().calls
    }

    pub fn issue(&self, key: &str) -> Option<IssueSnapshot> {
        self.state
            .lock()
            .unwrap()
            .issues
            .iter()
            .find(|i| i.key == key)
            .cloned()
    }

    fn enter(&self, operation: &str, key: &str) -> Result<(), TrackerError> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        let fails = state
            .failures
            .iter()
            .any(|(op, k)| op == operation && (k == key || k == "*"));
        if fails {
            return Err(TrackerError::Status {
                operation: "fake",
                status: 500,
                body: format!("{operation} failed for {key}"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl IssueTracker for FakeTracker {
    async fn search_issues(
        &self,
        _query: &str,
        limit: u32,
    ) -> Result<Vec<IssueSnapshot>, TrackerError> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        if state.fail_search {
            return Err(TrackerError::Other("search unavailable".into()));
        }
        Ok(state.issues.iter().take(limit as usize).cloned().collect())
    }

    async fn get_issue(&self, key: &str) -> Result<IssueSnapshot, TrackerError> {
        self.enter("get_issue", key)?;
        self.issue(key)
            .ok_or_else(|| TrackerError::NotFound(key.to_string()))
    }

    async fn get_comments(&self, key: &str) -> Result<Vec<Comment>, TrackerError> {
        self.enter("get_comments", key)?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .comments
            .get(key)
            .cloned()
            .unwrap_or_default())
    }

    async fn add_comment(&self, key: &str, body: &Value) -> Result<(), TrackerError> {
        self.enter("add_comment", key)?;
        let mut state = self.state.lock().unwrap();
        state.comments.entry(key.to_string()).or_default().push(Comment {
            id: None,
            created: Some(Utc::now()),
            body: body.clone(),
        });
        state.writes.push(Write::Comment {
            key: key.to_string(),
            text: adf::plain_text(body),
        });
        Ok(())
    }

    async fn set_assignee(&self, key: &str, account_id: &str) -> Result<(), TrackerError> {
        self.enter("set_assignee", key)?;
        let mut state = self.state.lock().unwrap();
        if let Some(issue) = state.issues.iter_mut().find(|i| i.key == key) {
            issue.assignee = Some(Assignee {
                account_id: account_id.to_string(),
                display_name: None,
            });
        }
        state.writes.push(Write::Assign {
            key: key.to_string(),
            account_id: account_id.to_string(),
        });
        Ok(())
    }

    async fn add_label(&self, key: &str, label: &str) -> Result<(), TrackerError> {
        self.enter("add_label", key)?;
        let mut state = self.state.lock().unwrap();
        if let Some(issue) = state.issues.iter_mut().find(|i| i.key == key) {
            if !issue.has_label(label) {
                issue.labels.push(label.to_string());
            }
        }
        state.writes.push(Write::Label {
            key: key.to_string(),
            label: label.to_string(),
        });
        Ok(())
    }
}

/// Issue in `status`, last updated `updated_hours_ago` hours ago.
pub fn issue(key: &str, status: &str, updated_hours_ago: i64, assignee: Option<&str>) -> IssueSnapshot {
    IssueSnapshot {
        key: key.to_string(),
        summary: format!("Customer problem {key}"),
        status: status.to_string(),
        updated: Some(Utc::now() - Duration::hours(updated_hours_ago)),
        assignee: assignee.map(|id| Assignee {
            account_id: id.to_string(),
            display_name: None,
        }),
        labels: Vec::new(),
        sla: None,
    }
}

pub const BLOCKED: &str = "Waiting for support";
pub const ACTOR: &str = "acc-actor";
