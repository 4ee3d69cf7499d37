#![allow(dead_code)]

use std::sync::Once;

use chrono::{DateTime, TimeZone, Utc};
use knock_core::{
    update, AppState, Effect, Job, JobStatus, Msg, ResumeChoice, StartOutcome, SubscriptionId,
};

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(knock_logging::initialize_for_tests);
}

pub fn at(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 5, 10, minute, 0).unwrap()
}

pub fn job(id: &str, status: JobStatus) -> Job {
    Job {
        id: id.to_string(),
        user_id: Some("u1".to_string()),
        status,
        total: 0,
        sent_count: 0,
        failed_count: 0,
        started_at: at(0),
        completed_at: None,
        pause_reason: None,
    }
}

pub fn resume(id: &str) -> ResumeChoice {
    ResumeChoice {
        id: id.to_string(),
        shared_url: format!("https://drive.example.com/{id}"),
    }
}

/// Loads one resume link and runs a successful start for `started`.
pub fn started_state(started: Job) -> (AppState, Vec<Effect>) {
    let (state, _) = update(AppState::new(), Msg::ResumesLoaded(vec![resume("r1")]));
    let (state, _) = update(state, Msg::StartClicked);
    update(state, Msg::StartSucceeded(StartOutcome::Started(started)))
}

pub fn subscription_of(effects: &[Effect]) -> Option<SubscriptionId> {
    effects.iter().find_map(|effect| match effect {
        Effect::Subscribe { subscription, .. } => Some(*subscription),
        _ => None,
    })
}
