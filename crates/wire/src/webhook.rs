// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The subset of GitHub webhook payloads the control plane reads.

use cattery_core::Job;
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Organization {
    pub login: String,
}

/// `workflow_job` payload fields.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowJob {
    pub id: i64,
    pub run_id: i64,
    pub name: String,
    #[serde(default)]
    pub workflow_name: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub runner_name: Option<String>,
}

/// Envelope for `X-GitHub-Event: workflow_job`.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowJobEvent {
    pub action: String,
    pub workflow_job: WorkflowJob,
    pub repository: Repository,
    pub organization: Organization,
}

impl WorkflowJobEvent {
    /// The single label a job must carry to be scheduled here.
    ///
    /// Multi-label jobs are not ours to run; returns `None` so the caller
    /// ignores them.
    pub fn single_label(&self) -> Option<&str> {
        match self.workflow_job.labels.as_slice() {
            [label] => Some(label),
            _ => None,
        }
    }

    /// Build the queue entry for this event once its label resolved to
    /// `tray_type`.
    pub fn to_job(&self, tray_type: &str, now: DateTime<Utc>) -> Job {
        Job {
            id: self.workflow_job.id,
            workflow_id: self.workflow_job.run_id,
            name: self.workflow_job.name.clone(),
            workflow_name: self.workflow_job.workflow_name.clone().unwrap_or_default(),
            repository: self.repository.name.clone(),
            organization: self.organization.login.clone(),
            runner_name: self.workflow_job.runner_name.clone().unwrap_or_default(),
            labels: self.workflow_job.labels.clone(),
            tray_type: tray_type.to_string(),
            created_at: now,
        }
    }
}

/// `workflow_run` payload fields.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowRun {
    pub id: i64,
    #[serde(default)]
    pub conclusion: Option<String>,
}

/// Envelope for `X-GitHub-Event: workflow_run`.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowRunEvent {
    pub action: String,
    pub workflow_run: WorkflowRun,
    pub repository: Repository,
    pub organization: Organization,
}

#[cfg(test)]
#[path = "webhook_tests.rs"]
mod tests;
