use chrono::{DateTime, Utc};

use crate::{Job, JobAction, JobStatus, PendingRequest, ResumeChoice};

const SHORT_ID_LEN: usize = 8;

/// Affordances the job panel may offer for the current snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelAction {
    Pause,
    Resume,
    RetryFailed,
    NewJob,
}

impl PanelAction {
    /// The server action behind this affordance, if any.
    pub fn job_action(self) -> Option<JobAction> {
        match self {
            PanelAction::Pause => Some(JobAction::Pause),
            PanelAction::Resume => Some(JobAction::Resume),
            PanelAction::RetryFailed => Some(JobAction::Retry),
            PanelAction::NewJob => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PanelAction::Pause => "Pause",
            PanelAction::Resume => "Resume",
            PanelAction::RetryFailed => "Retry Failed",
            PanelAction::NewJob => "New Job",
        }
    }
}

/// Percentage of recipients processed, in `0..=100`. Zero while the total is unknown.
pub fn progress_percent(job: &Job) -> u8 {
    if job.total == 0 {
        return 0;
    }
    let ratio = job.processed() as f64 / job.total as f64;
    (ratio * 100.0).round().clamp(0.0, 100.0) as u8
}

pub fn available_actions(status: JobStatus, failed_count: u64) -> Vec<PanelAction> {
    let mut actions = Vec::with_capacity(2);
    match status {
        JobStatus::Running => actions.push(PanelAction::Pause),
        JobStatus::Paused => actions.push(PanelAction::Resume),
        JobStatus::Completed => {}
    }
    if matches!(status, JobStatus::Paused | JobStatus::Completed) && failed_count > 0 {
        actions.push(PanelAction::RetryFailed);
    }
    if status == JobStatus::Completed {
        actions.push(PanelAction::NewJob);
    }
    actions
}

pub fn is_action_allowed(job: &Job, action: JobAction) -> bool {
    available_actions(job.status, job.failed_count)
        .iter()
        .any(|offered| offered.job_action() == Some(action))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobView {
    pub id: String,
    pub short_id: String,
    pub status: JobStatus,
    pub total: u64,
    pub sent_count: u64,
    pub failed_count: u64,
    pub processed: u64,
    pub progress: u8,
    pub pause_reason: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub actions: Vec<PanelAction>,
    /// A stream subscription is currently open for this job.
    pub live: bool,
}

impl JobView {
    pub fn from_job(job: &Job, live: bool) -> Self {
        Self {
            id: job.id.clone(),
            short_id: short_id(&job.id),
            status: job.status,
            total: job.total,
            sent_count: job.sent_count,
            failed_count: job.failed_count,
            processed: job.processed(),
            progress: progress_percent(job),
            pause_reason: job.pause_reason.clone(),
            started_at: job.started_at,
            completed_at: job.completed_at,
            actions: available_actions(job.status, job.failed_count),
            live,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub job: Option<JobView>,
    pub resumes: Vec<ResumeChoice>,
    pub active_resume: Option<String>,
    pub can_start: bool,
    pub pending: Option<PendingRequest>,
    pub dirty: bool,
}

fn short_id(id: &str) -> String {
    if id.chars().count() <= SHORT_ID_LEN {
        return id.to_string();
    }
    let head: String = id.chars().take(SHORT_ID_LEN).collect();
    format!("{head}…")
}
