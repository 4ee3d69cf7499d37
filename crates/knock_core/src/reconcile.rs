//! Folding of stream deltas into stored job snapshots.
use chrono::{DateTime, Utc};

use crate::{Job, JobStatus, JobStore, JobUpdate};

/// What the stream subscription should do after an event was folded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamDirective {
    Continue,
    /// The job reached its terminal state; the subscription must be closed.
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Whether a stored snapshot existed and was replaced.
    pub merged: bool,
    pub directive: StreamDirective,
}

/// Pure merge of one delta into a snapshot.
///
/// Present fields overwrite, absent fields are kept. Reaching COMPLETED stamps
/// `completed_at` with `now` and drops a stale pause reason unless the same
/// event carries one. A job that is already COMPLETED keeps its status and
/// completion time.
pub fn apply_update(job: &Job, update: &JobUpdate, now: DateTime<Utc>) -> Job {
    let mut next = job.clone();

    if let Some(status) = update.status {
        if !job.status.is_terminal() {
            next.status = status;
            if status == JobStatus::Completed {
                next.completed_at = Some(now);
                next.pause_reason = None;
            }
        }
    }
    if let Some(total) = update.total {
        next.total = total;
    }
    if let Some(sent_count) = update.sent_count {
        next.sent_count = sent_count;
    }
    if let Some(failed_count) = update.failed_count {
        next.failed_count = failed_count;
    }
    if let Some(reason) = &update.reason {
        next.pause_reason = Some(reason.clone());
    }

    next
}

/// Applies a stream delta to the stored snapshot for `job_id`.
///
/// Never creates a snapshot. A COMPLETED status always asks for the
/// subscription to be closed, whether or not a snapshot was stored.
pub fn reconcile(
    store: &mut JobStore,
    job_id: &str,
    update: &JobUpdate,
    now: DateTime<Utc>,
) -> ReconcileOutcome {
    let merged = store.merge(job_id, |job| apply_update(job, update, now));
    let directive = if update.status == Some(JobStatus::Completed) {
        StreamDirective::Close
    } else {
        StreamDirective::Continue
    };
    ReconcileOutcome { merged, directive }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn started() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 5, 10, 0, 0).unwrap()
    }

    fn running(id: &str) -> Job {
        Job {
            id: id.to_string(),
            user_id: Some("u1".to_string()),
            status: JobStatus::Running,
            total: 0,
            sent_count: 0,
            failed_count: 0,
            started_at: started(),
            completed_at: None,
            pause_reason: None,
        }
    }

    #[test]
    fn absent_fields_are_preserved() {
        let now = started() + Duration::minutes(1);
        let update = JobUpdate {
            sent_count: Some(5),
            total: Some(10),
            ..JobUpdate::default()
        };
        let next = apply_update(&running("j1"), &update, now);
        assert_eq!(next.sent_count, 5);
        assert_eq!(next.total, 10);
        assert_eq!(next.failed_count, 0);
        assert_eq!(next.status, JobStatus::Running);
        assert_eq!(next.completed_at, None);
    }

    #[test]
    fn empty_update_changes_nothing() {
        let job = running("j1");
        assert_eq!(apply_update(&job, &JobUpdate::default(), started()), job);
    }

    #[test]
    fn every_present_field_overwrites_exactly_that_field() {
        let job = running("j1");
        let now = started();
        let cases = [
            JobUpdate {
                total: Some(7),
                ..JobUpdate::default()
            },
            JobUpdate {
                failed_count: Some(2),
                ..JobUpdate::default()
            },
            JobUpdate {
                status: Some(JobStatus::Paused),
                reason: Some("Gmail quota reached".to_string()),
                ..JobUpdate::default()
            },
        ];

        let expected = [
            Job {
                total: 7,
                ..job.clone()
            },
            Job {
                failed_count: 2,
                ..job.clone()
            },
            Job {
                status: JobStatus::Paused,
                pause_reason: Some("Gmail quota reached".to_string()),
                ..job.clone()
            },
        ];

        for (update, expected) in cases.iter().zip(expected.iter()) {
            assert_eq!(&apply_update(&job, update, now), expected);
        }
    }

    #[test]
    fn completion_stamps_time_and_clears_stale_pause_reason() {
        let now = started() + Duration::minutes(5);
        let job = Job {
            pause_reason: Some("rate limited".to_string()),
            ..running("j1")
        };
        let update = JobUpdate {
            status: Some(JobStatus::Completed),
            ..JobUpdate::default()
        };
        let next = apply_update(&job, &update, now);
        assert_eq!(next.status, JobStatus::Completed);
        assert_eq!(next.completed_at, Some(now));
        assert_eq!(next.pause_reason, None);
    }

    #[test]
    fn completed_job_keeps_status_and_completion_time() {
        let first = started() + Duration::minutes(5);
        let later = first + Duration::minutes(1);
        let done = apply_update(
            &running("j1"),
            &JobUpdate {
                status: Some(JobStatus::Completed),
                ..JobUpdate::default()
            },
            first,
        );

        let after = apply_update(
            &done,
            &JobUpdate {
                status: Some(JobStatus::Running),
                ..JobUpdate::default()
            },
            later,
        );
        assert_eq!(after.status, JobStatus::Completed);
        assert_eq!(after.completed_at, Some(first));

        let again = apply_update(
            &done,
            &JobUpdate {
                status: Some(JobStatus::Completed),
                ..JobUpdate::default()
            },
            later,
        );
        assert_eq!(again.completed_at, Some(first));
    }

    #[test]
    fn reconcile_without_snapshot_leaves_store_absent() {
        let mut store = JobStore::new();
        let outcome = reconcile(
            &mut store,
            "j1",
            &JobUpdate {
                sent_count: Some(1),
                ..JobUpdate::default()
            },
            started(),
        );
        assert!(!outcome.merged);
        assert_eq!(outcome.directive, StreamDirective::Continue);
        assert!(store.get("j1").is_none());
    }

    #[test]
    fn reconcile_requests_close_on_completion() {
        let mut store = JobStore::new();
        store.set(running("j1"));
        let outcome = reconcile(
            &mut store,
            "j1",
            &JobUpdate {
                status: Some(JobStatus::Completed),
                ..JobUpdate::default()
            },
            started(),
        );
        assert!(outcome.merged);
        assert_eq!(outcome.directive, StreamDirective::Close);
        assert!(store.get("j1").unwrap().completed_at.is_some());
    }
}
