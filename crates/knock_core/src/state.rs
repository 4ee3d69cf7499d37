use crate::view_model::{AppViewModel, JobView};
use crate::{Effect, Job, JobAction, JobId, JobStatus, JobStore, ResumeChoice, SubscriptionId};

/// Server request the panel is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingRequest {
    Start,
    Action(JobAction),
    Refresh,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ActiveSubscription {
    pub(crate) id: SubscriptionId,
    pub(crate) job_id: JobId,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    store: JobStore,
    active_job: Option<JobId>,
    subscription: Option<ActiveSubscription>,
    last_subscription: SubscriptionId,
    resumes: Vec<ResumeChoice>,
    selected_resume: Option<String>,
    pending: Option<PendingRequest>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AppViewModel {
        let job = self.active_snapshot().map(|job| {
            let live = self
                .subscription
                .as_ref()
                .is_some_and(|sub| sub.job_id == job.id);
            JobView::from_job(job, live)
        });
        let active_resume = self.active_resume_id().map(ToOwned::to_owned);
        let can_start =
            job.is_none() && active_resume.is_some() && self.pending.is_none();

        AppViewModel {
            job,
            resumes: self.resumes.clone(),
            active_resume,
            can_start,
            pending: self.pending,
            dirty: self.dirty,
        }
    }

    pub fn store(&self) -> &JobStore {
        &self.store
    }

    pub fn active_job_id(&self) -> Option<&str> {
        self.active_job.as_deref()
    }

    pub fn active_snapshot(&self) -> Option<&Job> {
        self.active_job
            .as_deref()
            .and_then(|job_id| self.store.get(job_id))
    }

    pub fn current_subscription(&self) -> Option<(SubscriptionId, &str)> {
        self.subscription
            .as_ref()
            .map(|sub| (sub.id, sub.job_id.as_str()))
    }

    pub fn pending(&self) -> Option<PendingRequest> {
        self.pending
    }

    /// The user's selection if it is still offered, else the first link.
    pub fn active_resume_id(&self) -> Option<&str> {
        if let Some(selected) = self.selected_resume.as_deref() {
            if self.resumes.iter().any(|resume| resume.id == selected) {
                return Some(selected);
            }
        }
        self.resumes.first().map(|resume| resume.id.as_str())
    }

    /// Returns whether the state changed since the last call and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn store_mut(&mut self) -> &mut JobStore {
        &mut self.store
    }

    pub(crate) fn set_pending(&mut self, pending: Option<PendingRequest>) {
        if self.pending != pending {
            self.pending = pending;
            self.mark_dirty();
        }
    }

    pub(crate) fn set_resumes(&mut self, resumes: Vec<ResumeChoice>) {
        self.resumes = resumes;
        self.mark_dirty();
    }

    pub(crate) fn select_resume(&mut self, resume_id: String) {
        self.selected_resume = Some(resume_id);
        self.mark_dirty();
    }

    /// Whether a new job may be started, given the active one.
    pub(crate) fn start_allowed(&self) -> bool {
        match self.active_snapshot() {
            None => true,
            Some(job) => job.status == JobStatus::Completed,
        }
    }

    /// Makes `job` the one observed job, discarding interest in any previous one.
    pub(crate) fn adopt_job(&mut self, job: Job) -> Vec<Effect> {
        let mut effects = Vec::new();
        if let Some(previous) = self.active_job.take() {
            if previous != job.id {
                effects.extend(self.close_subscription_for(&previous));
                self.store.remove(&previous);
            }
        }
        self.active_job = Some(job.id.clone());
        self.store.set(job);
        self.mark_dirty();
        effects
    }

    /// Drops the active job and closes its stream.
    pub(crate) fn discard_active_job(&mut self) -> Vec<Effect> {
        let Some(job_id) = self.active_job.take() else {
            return Vec::new();
        };
        let effects = self.close_subscription_for(&job_id).into_iter().collect();
        self.store.remove(&job_id);
        self.mark_dirty();
        effects
    }

    /// Allocates a new subscription id for `job_id`, superseding the current one.
    pub(crate) fn open_subscription(&mut self, job_id: JobId) -> Effect {
        self.last_subscription += 1;
        let id = self.last_subscription;
        self.subscription = Some(ActiveSubscription {
            id,
            job_id: job_id.clone(),
        });
        self.mark_dirty();
        Effect::Subscribe {
            subscription: id,
            job_id,
        }
    }

    pub(crate) fn is_current_subscription(&self, subscription: SubscriptionId) -> bool {
        self.subscription
            .as_ref()
            .is_some_and(|sub| sub.id == subscription)
    }

    pub(crate) fn close_subscription(&mut self) -> Option<Effect> {
        let sub = self.subscription.take()?;
        self.mark_dirty();
        Some(Effect::Unsubscribe {
            subscription: sub.id,
        })
    }

    fn close_subscription_for(&mut self, job_id: &str) -> Option<Effect> {
        if self
            .subscription
            .as_ref()
            .is_some_and(|sub| sub.job_id == job_id)
        {
            self.close_subscription()
        } else {
            None
        }
    }

    /// Forgets everything tied to the signed-in user.
    pub(crate) fn reset_session(&mut self) -> Vec<Effect> {
        let effects: Vec<Effect> = self.close_subscription().into_iter().collect();
        self.store.clear();
        self.active_job = None;
        self.pending = None;
        self.resumes.clear();
        self.selected_resume = None;
        self.mark_dirty();
        effects
    }
}
