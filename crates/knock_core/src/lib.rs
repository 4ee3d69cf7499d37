//! Knock Knock core: job model, snapshot store, stream reconciliation and the
//! pure job-panel state machine.
mod effect;
mod job;
mod msg;
mod reconcile;
mod state;
mod store;
mod update;
mod view_model;

pub use effect::{Effect, Notice, NoticeLevel};
pub use job::{
    Job, JobAction, JobId, JobStatus, JobUpdate, ResumeChoice, StartOutcome, SubscriptionId,
};
pub use msg::Msg;
pub use reconcile::{apply_update, reconcile, ReconcileOutcome, StreamDirective};
pub use state::{AppState, PendingRequest};
pub use store::JobStore;
pub use update::update;
pub use view_model::{
    available_actions, is_action_allowed, progress_percent, AppViewModel, JobView, PanelAction,
};
