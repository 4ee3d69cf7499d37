use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Server-assigned job identifier. Opaque to the client.
pub type JobId = String;

/// Identifies one stream subscription opened by the job panel.
pub type SubscriptionId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Running,
    Paused,
    Completed,
}

impl JobStatus {
    pub fn label(self) -> &'static str {
        match self {
            JobStatus::Running => "RUNNING",
            JobStatus::Paused => "PAUSED",
            JobStatus::Completed => "COMPLETED",
        }
    }

    pub fn is_terminal(self) -> bool {
        self == JobStatus::Completed
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One bulk email-sending run as last reported by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: JobId,
    #[serde(default)]
    pub user_id: Option<String>,
    pub status: JobStatus,
    pub total: u64,
    pub sent_count: u64,
    pub failed_count: u64,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub pause_reason: Option<String>,
}

impl Job {
    /// Recipients already attempted, successful or not.
    pub fn processed(&self) -> u64 {
        self.sent_count.saturating_add(self.failed_count)
    }
}

/// Sparse delta pushed over the job stream. Absent fields mean "unchanged".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobUpdate {
    #[serde(default)]
    pub status: Option<JobStatus>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub sent_count: Option<u64>,
    #[serde(default)]
    pub failed_count: Option<u64>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl JobUpdate {
    pub fn is_empty(&self) -> bool {
        self == &JobUpdate::default()
    }
}

/// Server answer to a start request: either a new job or a reason it declined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StartOutcome {
    Started(Job),
    Declined { message: String },
}

/// Actions the server accepts on an existing job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobAction {
    Pause,
    Resume,
    Retry,
}

impl JobAction {
    /// Path segment used by `POST /jobs/{id}/{action}`.
    pub fn as_str(self) -> &'static str {
        match self {
            JobAction::Pause => "pause",
            JobAction::Resume => "resume",
            JobAction::Retry => "retry",
        }
    }

    pub fn past_tense(self) -> &'static str {
        match self {
            JobAction::Pause => "paused",
            JobAction::Resume => "resumed",
            JobAction::Retry => "retried",
        }
    }

    /// Whether a successful action restarts sending and needs a live stream.
    pub fn reopens_stream(self) -> bool {
        matches!(self, JobAction::Resume | JobAction::Retry)
    }
}

impl fmt::Display for JobAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resume link the user can attach to a new job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeChoice {
    pub id: String,
    pub shared_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_deserializes_from_server_shape() {
        let raw = r#"{
            "id": "j1",
            "userId": "u1",
            "status": "RUNNING",
            "total": 0,
            "sentCount": 0,
            "failedCount": 0,
            "startedAt": "2026-01-05T10:00:00.000Z",
            "completedAt": null
        }"#;
        let job: Job = serde_json::from_str(raw).unwrap();
        assert_eq!(job.id, "j1");
        assert_eq!(job.status, JobStatus::Running);
        assert_eq!(job.completed_at, None);
        assert_eq!(job.pause_reason, None);
    }

    #[test]
    fn start_outcome_distinguishes_declined_message() {
        let declined: StartOutcome =
            serde_json::from_str(r#"{"message":"No recipients to send to"}"#).unwrap();
        assert_eq!(
            declined,
            StartOutcome::Declined {
                message: "No recipients to send to".to_string()
            }
        );
    }

    #[test]
    fn sparse_update_leaves_missing_fields_empty() {
        let update: JobUpdate = serde_json::from_str(r#"{"sentCount":5,"total":10}"#).unwrap();
        assert_eq!(update.sent_count, Some(5));
        assert_eq!(update.total, Some(10));
        assert_eq!(update.status, None);
        assert_eq!(update.failed_count, None);
        assert!(!update.is_empty());
        assert!(JobUpdate::default().is_empty());
    }
}
