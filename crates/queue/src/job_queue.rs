// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dual-indexed in-memory job queue.

use cattery_core::Job;
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Default)]
struct Indexes {
    jobs: HashMap<i64, Job>,
    groups: HashMap<String, HashMap<i64, Job>>,
}

/// Concurrent two-index view of pending jobs: a primary map by job id and
/// a group map by tray type. Readers run concurrently; writers exclusive.
///
/// Group entries persist at zero once created so a count snapshot keeps
/// reporting a type after its last job drains; that zero is what lets the
/// reconcile loop scale the type back down.
#[derive(Default)]
pub struct JobQueue {
    inner: RwLock<Indexes>,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a job. No-op on a duplicate id; returns whether it was added.
    pub fn add(&self, job: &Job) -> bool {
        let mut inner = self.inner.write();
        if inner.jobs.contains_key(&job.id) {
            return false;
        }
        inner.jobs.insert(job.id, job.clone());
        inner.groups.entry(job.tray_type.clone()).or_default().insert(job.id, job.clone());
        true
    }

    /// Remove a job from both indexes, returning it if present.
    pub fn delete(&self, job_id: i64) -> Option<Job> {
        let mut inner = self.inner.write();
        let job = inner.jobs.remove(&job_id)?;
        if let Some(group) = inner.groups.get_mut(&job.tray_type) {
            group.remove(&job_id);
        }
        Some(job)
    }

    pub fn get(&self, job_id: i64) -> Option<Job> {
        self.inner.read().jobs.get(&job_id).cloned()
    }

    /// Consistent `{trayType → queued}` snapshot, including drained groups.
    pub fn jobs_count(&self) -> HashMap<String, usize> {
        let inner = self.inner.read();
        inner.groups.iter().map(|(name, group)| (name.clone(), group.len())).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().jobs.is_empty()
    }
}

#[cfg(test)]
#[path = "job_queue_tests.rs"]
mod tests;
