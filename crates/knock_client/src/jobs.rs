use std::pin::Pin;

use futures_util::Stream;
use knock_core::{Job, JobAction, JobUpdate, StartOutcome};
use knock_logging::knock_info;
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use serde::Serialize;

use crate::http::map_reqwest_error;
use crate::stream::parse_job_stream;
use crate::{ApiClient, ApiError};

/// Deltas from one job stream. Malformed messages never show up here; an
/// `Err` item means the connection failed and is the last item.
pub type JobEventStream = Pin<Box<dyn Stream<Item = Result<JobUpdate, ApiError>> + Send>>;

#[async_trait::async_trait]
pub trait JobApi: Send + Sync {
    async fn start_job(&self, resume_id: &str) -> Result<StartOutcome, ApiError>;

    async fn job_action(&self, job_id: &str, action: JobAction) -> Result<Job, ApiError>;

    /// `Ok(None)` when the server no longer knows the job.
    async fn job_status(&self, job_id: &str) -> Result<Option<Job>, ApiError>;

    async fn open_job_stream(&self, job_id: &str) -> Result<JobEventStream, ApiError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StartJobRequest<'a> {
    resume_id: &'a str,
}

#[async_trait::async_trait]
impl JobApi for ApiClient {
    async fn start_job(&self, resume_id: &str) -> Result<StartOutcome, ApiError> {
        let outcome: StartOutcome = self
            .post("/jobs/start", &StartJobRequest { resume_id })
            .await?;
        match &outcome {
            StartOutcome::Started(job) => knock_info!("job {} started", job.id),
            StartOutcome::Declined { message } => knock_info!("start declined: {}", message),
        }
        Ok(outcome)
    }

    async fn job_action(&self, job_id: &str, action: JobAction) -> Result<Job, ApiError> {
        let job: Job = self
            .post_empty(&format!("/jobs/{job_id}/{}", action.as_str()))
            .await?;
        knock_info!("job {} {} -> {}", job_id, action.past_tense(), job.status);
        Ok(job)
    }

    async fn job_status(&self, job_id: &str) -> Result<Option<Job>, ApiError> {
        self.get(&format!("/jobs/{job_id}/status")).await
    }

    async fn open_job_stream(&self, job_id: &str) -> Result<JobEventStream, ApiError> {
        let response = self
            .raw_get(&format!("/jobs/{job_id}/stream"))
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = self.check_status(response).await?;
        knock_info!("job {} stream opened", job_id);
        Ok(parse_job_stream(response))
    }
}
