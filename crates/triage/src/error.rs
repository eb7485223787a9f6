//! Error types for the triage engine.

use thiserror::Error;

/// Errors returned by an [`IssueTracker`](crate::tracker::IssueTracker) call.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// HTTP request failed before a response arrived
    #[error("HTTP request failed during {operation}: {source}")]
    Http {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// Tracker answered with a non-success status
    #[error("{operation} returned status {status}: {body}")]
    Status {
        operation: &'static str,
        status: u16,
        body: String,
    },

    /// Response body could not be decoded
    #[error("Failed to decode {operation} response: {message}")]
    Decode {
        operation: &'static str,
        message: String,
    },

    /// The requested issue does not exist or is not visible
    #[error("Issue not found: {0}")]
    NotFound(String),

    /// Other error (used by non-HTTP trackers)
    #[error("{0}")]
    Other(String),
}

/// Errors surfaced by triage operations.
///
/// Write failures inside a run never reach this type; they are recorded as
/// failed steps instead.
#[derive(Debug, Error)]
pub enum TriageError {
    /// Project scope or actor identity is missing
    #[error("Missing context: {0}")]
    MissingContext(String),

    /// A read from the tracker failed
    #[error("Tracker fetch failed: {0}")]
    TrackerFetch(#[source] TrackerError),

    /// A write to the tracker failed outside of a step boundary
    #[error("Tracker write failed: {0}")]
    TrackerWrite(#[source] TrackerError),

    /// Configuration is inconsistent
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl TriageError {
    /// Short machine-readable kind, used in JSON error bodies.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MissingContext(_) => "missing_context",
            Self::TrackerFetch(_) => "tracker_fetch_failure",
            Self::TrackerWrite(_) => "tracker_write_failure",
            Self::InvalidConfig(_) => "invalid_config",
        }
    }
}
