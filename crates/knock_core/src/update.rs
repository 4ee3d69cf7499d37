use crate::reconcile::{reconcile, StreamDirective};
use crate::view_model::is_action_allowed;
use crate::{
    AppState, Effect, Job, JobAction, JobStatus, Msg, Notice, NoticeLevel, PendingRequest,
    StartOutcome,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::Mounted => vec![Effect::LoadResumes],
        Msg::ResumesLoaded(resumes) => {
            state.set_resumes(resumes);
            Vec::new()
        }
        Msg::ResumeSelected(resume_id) => {
            state.select_resume(resume_id);
            Vec::new()
        }
        Msg::StartClicked => {
            if state.pending().is_some() || !state.start_allowed() {
                return (state, Vec::new());
            }
            match state.active_resume_id().map(ToOwned::to_owned) {
                Some(resume_id) => {
                    state.set_pending(Some(PendingRequest::Start));
                    vec![Effect::StartJob { resume_id }]
                }
                None => vec![notify(
                    NoticeLevel::Error,
                    "Select a resume link before starting",
                )],
            }
        }
        Msg::StartSucceeded(outcome) => {
            if state.pending() != Some(PendingRequest::Start) {
                return (state, Vec::new());
            }
            state.set_pending(None);
            match outcome {
                StartOutcome::Started(job) => {
                    let job_id = job.id.clone();
                    let mut effects = state.adopt_job(Job {
                        pause_reason: None,
                        ..job
                    });
                    effects.push(state.open_subscription(job_id));
                    effects
                }
                // Declined: nothing was created, nothing to observe.
                StartOutcome::Declined { message } => {
                    vec![notify(NoticeLevel::Info, message)]
                }
            }
        }
        Msg::StartFailed { message } => {
            if state.pending() != Some(PendingRequest::Start) {
                return (state, Vec::new());
            }
            state.set_pending(None);
            vec![notify(
                NoticeLevel::Error,
                message.unwrap_or_else(|| "Failed to start".to_string()),
            )]
        }
        Msg::ActionClicked(action) => {
            if state.pending().is_some() {
                return (state, Vec::new());
            }
            let Some(job) = state.active_snapshot() else {
                return (state, Vec::new());
            };
            if !is_action_allowed(job, action) {
                return (state, Vec::new());
            }
            let job_id = job.id.clone();
            state.set_pending(Some(PendingRequest::Action(action)));
            vec![Effect::RunAction { job_id, action }]
        }
        Msg::ActionSucceeded {
            job_id,
            action,
            job,
        } => {
            if state.pending() != Some(PendingRequest::Action(action)) {
                return (state, Vec::new());
            }
            state.set_pending(None);
            if state.active_job_id() != Some(job_id.as_str()) {
                return (state, Vec::new());
            }
            apply_action_result(&mut state, job_id, action, job)
        }
        Msg::ActionFailed {
            job_id: _,
            action,
            message,
        } => {
            if state.pending() != Some(PendingRequest::Action(action)) {
                return (state, Vec::new());
            }
            state.set_pending(None);
            vec![notify(
                NoticeLevel::Error,
                message.unwrap_or_else(|| format!("Failed to {action}")),
            )]
        }
        Msg::RefreshClicked => {
            if state.pending().is_some() {
                return (state, Vec::new());
            }
            let Some(job_id) = state.active_job_id().map(ToOwned::to_owned) else {
                return (state, Vec::new());
            };
            state.set_pending(Some(PendingRequest::Refresh));
            vec![Effect::FetchStatus { job_id }]
        }
        Msg::RefreshSucceeded { job_id, job } => {
            if state.pending() != Some(PendingRequest::Refresh) {
                return (state, Vec::new());
            }
            state.set_pending(None);
            if state.active_job_id() != Some(job_id.as_str()) {
                return (state, Vec::new());
            }
            match job {
                Some(job) => {
                    state.store_mut().set(job);
                    state.mark_dirty();
                    Vec::new()
                }
                // The server no longer knows the job.
                None => state.discard_active_job(),
            }
        }
        Msg::RefreshFailed { .. } => {
            if state.pending() != Some(PendingRequest::Refresh) {
                return (state, Vec::new());
            }
            state.set_pending(None);
            vec![notify(NoticeLevel::Error, "Failed to refresh status")]
        }
        Msg::StreamUpdate {
            subscription,
            job_id,
            update,
            received_at,
        } => {
            if !state.is_current_subscription(subscription) {
                return (state, Vec::new());
            }
            let outcome = reconcile(state.store_mut(), &job_id, &update, received_at);
            if outcome.merged {
                state.mark_dirty();
            }
            match outcome.directive {
                StreamDirective::Continue => Vec::new(),
                StreamDirective::Close => {
                    let mut effects: Vec<Effect> =
                        state.close_subscription().into_iter().collect();
                    effects.push(notify(NoticeLevel::Success, "Job completed"));
                    effects
                }
            }
        }
        // No automatic reconnect: recovery is an explicit refresh or resume.
        Msg::StreamFailed { subscription, .. } | Msg::StreamEnded { subscription, .. } => {
            if !state.is_current_subscription(subscription) {
                return (state, Vec::new());
            }
            state.close_subscription().into_iter().collect()
        }
        Msg::NewJobClicked => {
            let completed = state
                .active_snapshot()
                .is_some_and(|job| job.status == JobStatus::Completed);
            if !completed {
                return (state, Vec::new());
            }
            state.discard_active_job()
        }
        Msg::SessionExpired => {
            let mut effects = state.reset_session();
            effects.push(notify(
                NoticeLevel::Warning,
                "Session expired, please sign in again",
            ));
            effects
        }
        Msg::SignedOut => state.reset_session(),
        Msg::Teardown => state.close_subscription().into_iter().collect(),
    };

    (state, effects)
}

fn apply_action_result(
    state: &mut AppState,
    job_id: String,
    action: JobAction,
    job: Job,
) -> Vec<Effect> {
    // A finished job only leaves COMPLETED through an explicit retry.
    let finished = state
        .store()
        .get(&job_id)
        .is_some_and(|stored| stored.status.is_terminal());
    if finished && action != JobAction::Retry {
        return vec![notify(
            NoticeLevel::Success,
            format!("Job {}", action.past_tense()),
        )];
    }

    let pause_reason = if action.reopens_stream() {
        None
    } else {
        job.pause_reason.clone()
    };
    state.store_mut().set(Job { pause_reason, ..job });
    state.mark_dirty();

    let mut effects = Vec::with_capacity(2);
    if action.reopens_stream() {
        effects.push(state.open_subscription(job_id));
    }
    effects.push(notify(
        NoticeLevel::Success,
        format!("Job {}", action.past_tense()),
    ));
    effects
}

fn notify(level: NoticeLevel, text: impl Into<String>) -> Effect {
    Effect::Notify(Notice::new(level, text))
}
