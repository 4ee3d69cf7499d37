use std::fmt;

use knock_core::{Job, JobAction, JobId, JobUpdate, StartOutcome, SubscriptionId};

use crate::resources::{
    AiKeyOverview, AiProvider, ImportResponse, Recipient, ResumeLink, ResumeUploadResponse,
    SaveKeyResponse, SentEmail,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ApiError {
    pub(crate) fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.kind == ErrorKind::Unauthorized
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The bearer credential was rejected; it has already been discarded.
    Unauthorized,
    HttpStatus(u16),
    Timeout,
    Network,
    InvalidUrl,
    Decode,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Unauthorized => write!(f, "unauthorized"),
            ErrorKind::HttpStatus(code) => write!(f, "http status {code}"),
            ErrorKind::Timeout => write!(f, "timeout"),
            ErrorKind::Network => write!(f, "network error"),
            ErrorKind::InvalidUrl => write!(f, "invalid url"),
            ErrorKind::Decode => write!(f, "unexpected response body"),
        }
    }
}

/// What happened on a stream subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamSignal {
    Update(JobUpdate),
    /// The connection failed. The subscription is over; nothing reconnects.
    Failed(ApiError),
    /// The server closed the stream.
    Ended,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    Authenticated {
        access_token: String,
    },
    AuthFailed(ApiError),
    ResumesLoaded(Result<Vec<ResumeLink>, ApiError>),
    StartFinished(Result<StartOutcome, ApiError>),
    ActionFinished {
        job_id: JobId,
        action: JobAction,
        result: Result<Job, ApiError>,
    },
    StatusFetched {
        job_id: JobId,
        result: Result<Option<Job>, ApiError>,
    },
    Stream {
        subscription: SubscriptionId,
        job_id: JobId,
        signal: StreamSignal,
    },
    /// A request or stream was rejected with 401; the credential is gone.
    SessionExpired,
    GmailConnectUrl(Result<String, ApiError>),
    AiKeysLoaded(Result<AiKeyOverview, ApiError>),
    AiKeySaved {
        provider: AiProvider,
        result: Result<SaveKeyResponse, ApiError>,
    },
    AiKeyDeleted {
        provider: AiProvider,
        result: Result<SaveKeyResponse, ApiError>,
    },
    RecipientsLoaded(Result<Vec<Recipient>, ApiError>),
    RecipientsImported(Result<ImportResponse, ApiError>),
    ResumeUploaded(Result<ResumeUploadResponse, ApiError>),
    SentEmailsLoaded(Result<Vec<SentEmail>, ApiError>),
}
