use crate::{JobAction, JobId, SubscriptionId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    LoadResumes,
    StartJob { resume_id: String },
    RunAction { job_id: JobId, action: JobAction },
    FetchStatus { job_id: JobId },
    /// Open the job stream. Any subscription held before is superseded.
    Subscribe {
        subscription: SubscriptionId,
        job_id: JobId,
    },
    /// Close the given subscription. Closing one that already ended is harmless.
    Unsubscribe { subscription: SubscriptionId },
    Notify(Notice),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A transient user-facing notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }
}
