mod common;

use common::{job, resume};
use knock_core::{update, AppState, JobAction, JobStatus, Msg};

#[test]
fn unsolicited_reply_is_noop() {
    let (state, _) = update(AppState::new(), Msg::ResumesLoaded(vec![resume("r1")]));
    let mut state = state;
    state.consume_dirty();

    let (mut next, effects) = update(
        state.clone(),
        Msg::ActionSucceeded {
            job_id: "j1".to_string(),
            action: JobAction::Pause,
            job: job("j1", JobStatus::Paused),
        },
    );

    assert_eq!(state, next);
    assert!(effects.is_empty());
    assert!(!next.consume_dirty());
}

#[test]
fn stream_end_without_subscription_does_not_dirty_state() {
    let (mut next, effects) = update(
        AppState::new(),
        Msg::StreamEnded {
            subscription: 7,
            job_id: "j1".to_string(),
        },
    );
    assert!(effects.is_empty());
    assert!(!next.consume_dirty());
}
