// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Queued workflow job awaiting a runner.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a workflow job at the source provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    InProgress,
    Finished,
}

impl JobStatus {
    /// Map a `workflow_job` webhook action onto a status.
    pub fn from_action(action: &str) -> Option<JobStatus> {
        match action {
            "queued" => Some(JobStatus::Queued),
            "in_progress" => Some(JobStatus::InProgress),
            "completed" => Some(JobStatus::Finished),
            _ => None,
        }
    }
}

crate::simple_display! {
    JobStatus {
        Queued => "queued",
        InProgress => "in_progress",
        Finished => "finished",
    }
}

/// A queued workflow job, keyed by the source provider's event id.
///
/// A job exists in the queue iff the source reported it `queued` and no
/// `in_progress`/`completed` event has been observed since.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// Source-provider event id; doubles as the document primary key.
    #[serde(rename = "_id")]
    pub id: i64,
    pub workflow_id: i64,
    pub name: String,
    pub workflow_name: String,
    pub repository: String,
    pub organization: String,
    #[serde(default)]
    pub runner_name: String,
    /// Exactly one label; multi-label jobs are filtered out upstream.
    pub labels: Vec<String>,
    /// Tray type resolved by label match before insertion.
    pub tray_type: String,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

crate::builder! {
    pub struct JobBuilder => Job {
        into {
            name: String = "build",
            workflow_name: String = "ci",
            repository: String = "widgets",
            organization: String = "acme",
            runner_name: String = "",
            tray_type: String = "gpu",
        }
        set {
            id: i64 = 100,
            workflow_id: i64 = 9,
            labels: Vec<String> = vec!["gpu".to_string()],
        }
        computed {
            created_at: DateTime<Utc> = Utc::now(),
        }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
