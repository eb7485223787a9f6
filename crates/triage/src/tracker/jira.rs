//! Jira Cloud REST client.
//!
//! API Documentation: <https://developer.atlassian.com/cloud/jira/platform/rest/v3/>

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{json, Value};
use tracing::{debug, instrument};

use super::IssueTracker;
use crate::config::TrackerConfig;
use crate::error::TrackerError;
use crate::models::{Assignee, Comment, IssueSnapshot};

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Page size for comment listing.
const COMMENT_PAGE_SIZE: u32 = 100;

/// Jira REST API v3 client using basic auth (email + API token).
#[derive(Clone)]
pub struct JiraClient {
    client: Client,
    base_url: String,
    email: String,
    api_token: String,
    sla_field: String,
}

impl JiraClient {
    /// Create a new client.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: TrackerConfig) -> Result<Self, TrackerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|source| TrackerError::Http {
                operation: "build_client",
                source,
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            email: config.email,
            api_token: config.api_token,
            sla_field: config.sla_field,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn fields(&self) -> String {
        format!("summary,status,updated,assignee,labels,{}", self.sla_field)
    }

    /// Make an authenticated GET request and decode the JSON body.
    async fn get_json(
        &self,
        operation: &'static str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Value, TrackerError> {
        let url = self.url(path);
        debug!(url = %url, operation, "GET request");

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.email, Some(&self.api_token))
            .query(query)
            .send()
            .await
            .map_err(|source| TrackerError::Http { operation, source })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TrackerError::Status {
                operation,
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| TrackerError::Decode {
                operation,
                message: e.to_string(),
            })
    }

    /// Send an authenticated write. The response body is never parsed, so
    /// `204 No Content` and empty `2xx` bodies are both success.
    async fn write(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<(), TrackerError> {
        let response = request
            .basic_auth(&self.email, Some(&self.api_token))
            .send()
            .await
            .map_err(|source| TrackerError::Http { operation, source })?;

        let status = response.status();
        if status.is_success() {
            debug!(operation, status = status.as_u16(), "Write accepted");
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(TrackerError::Status {
                operation,
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[async_trait]
impl IssueTracker for JiraClient {
    #[instrument(skip(self))]
    async fn search_issues(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<IssueSnapshot>, TrackerError> {
        let body = self
            .get_json(
                "search_issues",
                "/rest/api/3/search/jql",
                &[
                    ("jql", query.to_string()),
                    ("maxResults", limit.to_string()),
                    ("fields", self.fields()),
                ],
            )
            .await?;

        let issues = body
            .get("issues")
            .and_then(Value::as_array)
            .ok_or_else(|| TrackerError::Decode {
                operation: "search_issues",
                message: "missing issues array".to_string(),
            })?;

        let snapshots: Vec<IssueSnapshot> = issues
            .iter()
            .filter_map(|issue| parse_issue(issue, &self.sla_field))
            .collect();
        debug!(count = snapshots.len(), "Search returned issues");
        Ok(snapshots)
    }

    #[instrument(skip(self), fields(issue_key = %key))]
    async fn get_issue(&self, key: &str) -> Result<IssueSnapshot, TrackerError> {
        let path = format!("/rest/api/3/issue/{key}");
        let body = match self
            .get_json("get_issue", &path, &[("fields", self.fields())])
            .await
        {
            Err(TrackerError::Status { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                return Err(TrackerError::NotFound(key.to_string()));
            }
            other => other?,
        };

        parse_issue(&body, &self.sla_field).ok_or_else(|| TrackerError::Decode {
            operation: "get_issue",
            message: format!("issue {key} has no key field"),
        })
    }

    #[instrument(skip(self), fields(issue_key = %key))]
    async fn get_comments(&self, key: &str) -> Result<Vec<Comment>, TrackerError> {
        let path = format!("/rest/api/3/issue/{key}/comment");
        let mut comments = Vec::new();
        let mut start_at: u64 = 0;

        loop {
            let page = self
                .get_json(
                    "get_comments",
                    &path,
                    &[
                        ("orderBy", "created".to_string()),
                        ("startAt", start_at.to_string()),
                        ("maxResults", COMMENT_PAGE_SIZE.to_string()),
                    ],
                )
                .await?;

            let batch = page
                .get("comments")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();
            comments.extend(batch.iter().map(parse_comment));

            let total = page.get("total").and_then(Value::as_u64).unwrap_or(0);
            start_at += batch.len() as u64;
            if batch.is_empty() || start_at >= total {
                break;
            }
        }

        debug!(count = comments.len(), "Fetched comments");
        Ok(comments)
    }

    #[instrument(skip(self, body), fields(issue_key = %key))]
    async fn add_comment(&self, key: &str, body: &Value) -> Result<(), TrackerError> {
        let url = self.url(&format!("/rest/api/3/issue/{key}/comment"));
        let request = self.client.post(url).json(&json!({ "body": body }));
        self.write("add_comment", request).await
    }

    #[instrument(skip(self), fields(issue_key = %key))]
    async fn set_assignee(&self, key: &str, account_id: &str) -> Result<(), TrackerError> {
        let url = self.url(&format!("/rest/api/3/issue/{key}/assignee"));
        let request = self.client.put(url).json(&json!({ "accountId": account_id }));
        self.write("set_assignee", request).await
    }

    #[instrument(skip(self), fields(issue_key = %key))]
    async fn add_label(&self, key: &str, label: &str) -> Result<(), TrackerError> {
        let url = self.url(&format!("/rest/api/3/issue/{key}"));
        let request = self
            .client
            .put(url)
            .json(&json!({ "update": { "labels": [{ "add": label }] } }));
        self.write("add_label", request).await
    }
}

// =========================================================================
// Projection parsing
// =========================================================================

/// Project a Jira issue document onto an [`IssueSnapshot`].
///
/// Lenient: only the key is required, everything else degrades to empty.
#[must_use]
pub fn parse_issue(issue: &Value, sla_field: &str) -> Option<IssueSnapshot> {
    let key = issue.get("key").and_then(Value::as_str)?.to_string();
    let fields = issue.get("fields").cloned().unwrap_or(Value::Null);

    let assignee = fields
        .get("assignee")
        .filter(|a| !a.is_null())
        .and_then(|a| {
            Some(Assignee {
                account_id: a.get("accountId").and_then(Value::as_str)?.to_string(),
                display_name: a
                    .get("displayName")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            })
        });

    let labels = fields
        .get("labels")
        .and_then(Value::as_array)
        .map(|labels| {
            labels
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Some(IssueSnapshot {
        key,
        summary: str_field(&fields, "/summary"),
        status: str_field(&fields, "/status/name"),
        updated: fields
            .get("updated")
            .and_then(Value::as_str)
            .and_then(parse_timestamp),
        assignee,
        labels,
        sla: fields.get(sla_field).filter(|v| !v.is_null()).cloned(),
    })
}

/// Project a Jira comment document onto a [`Comment`].
#[must_use]
pub fn parse_comment(comment: &Value) -> Comment {
    Comment {
        id: comment.get("id").and_then(Value::as_str).map(str::to_string),
        created: comment
            .get("created")
            .and_then(Value::as_str)
            .and_then(parse_timestamp),
        body: comment.get("body").cloned().unwrap_or(Value::Null),
    }
}

/// Parse Jira timestamps, which use `+0000` offsets rather than RFC 3339 `+00:00`.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn str_field(fields: &Value, pointer: &str) -> String {
    fields
        .pointer(pointer)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
