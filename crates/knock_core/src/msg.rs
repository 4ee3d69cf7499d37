use chrono::{DateTime, Utc};

use crate::{Job, JobAction, JobId, JobUpdate, ResumeChoice, StartOutcome, SubscriptionId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// The job panel became visible.
    Mounted,
    /// Resume links arrived from the server.
    ResumesLoaded(Vec<ResumeChoice>),
    /// User picked the resume link to attach to the next job.
    ResumeSelected(String),
    /// User clicked Start Job.
    StartClicked,
    StartSucceeded(StartOutcome),
    StartFailed { message: Option<String> },
    /// User clicked Pause, Resume or Retry Failed on the active job.
    ActionClicked(JobAction),
    ActionSucceeded {
        job_id: JobId,
        action: JobAction,
        job: Job,
    },
    ActionFailed {
        job_id: JobId,
        action: JobAction,
        message: Option<String>,
    },
    /// User asked for a fresh status snapshot.
    RefreshClicked,
    RefreshSucceeded { job_id: JobId, job: Option<Job> },
    RefreshFailed {
        job_id: JobId,
        message: Option<String>,
    },
    /// A well-formed delta arrived on a stream subscription.
    StreamUpdate {
        subscription: SubscriptionId,
        job_id: JobId,
        update: JobUpdate,
        received_at: DateTime<Utc>,
    },
    /// The stream connection itself failed.
    StreamFailed {
        subscription: SubscriptionId,
        job_id: JobId,
        message: String,
    },
    /// The server closed the stream.
    StreamEnded {
        subscription: SubscriptionId,
        job_id: JobId,
    },
    /// User clicked New Job on a completed job.
    NewJobClicked,
    /// The credential was rejected by the server.
    SessionExpired,
    /// User signed out.
    SignedOut,
    /// The job panel is going away.
    Teardown,
}
