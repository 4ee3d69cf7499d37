use std::collections::BTreeMap;

use crate::{Job, JobId};

/// Keyed cache of the last known snapshot per job id.
///
/// Every write replaces a whole `Job`, so a reader never observes a partially
/// applied update.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobStore {
    entries: BTreeMap<JobId, Job>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, job_id: &str) -> Option<&Job> {
        self.entries.get(job_id)
    }

    pub fn set(&mut self, job: Job) {
        self.entries.insert(job.id.clone(), job);
    }

    /// Applies `updater` to the stored snapshot, if any.
    ///
    /// Returns `false` and leaves the store untouched when no snapshot exists:
    /// a partial update never fabricates a record.
    pub fn merge<F>(&mut self, job_id: &str, updater: F) -> bool
    where
        F: FnOnce(&Job) -> Job,
    {
        let Some(current) = self.entries.get(job_id) else {
            return false;
        };
        let mut next = updater(current);
        // The id is immutable; an updater cannot move the entry.
        next.id = current.id.clone();
        self.entries.insert(next.id.clone(), next);
        true
    }

    pub fn remove(&mut self, job_id: &str) -> Option<Job> {
        self.entries.remove(job_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
