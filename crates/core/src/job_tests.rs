// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    queued = { "queued", Some(JobStatus::Queued) },
    in_progress = { "in_progress", Some(JobStatus::InProgress) },
    completed = { "completed", Some(JobStatus::Finished) },
    waiting = { "waiting", None },
)]
fn status_from_action(action: &str, expected: Option<JobStatus>) {
    assert_eq!(JobStatus::from_action(action), expected);
}

#[test]
fn job_persists_id_as_primary_key() {
    let job = Job::builder().id(42).build();
    let doc = bson::to_document(&job).unwrap();
    assert_eq!(doc.get_i64("_id").unwrap(), 42);
    assert_eq!(doc.get_str("trayType").unwrap(), "gpu");
}

#[test]
fn job_round_trips_through_bson() {
    let job = Job::builder().id(7).workflow_id(3).build();
    let doc = bson::to_document(&job).unwrap();
    let back: Job = bson::from_document(doc).unwrap();
    // bson datetimes carry millisecond precision
    assert_eq!(back.id, job.id);
    assert_eq!(back.workflow_id, job.workflow_id);
    assert_eq!(back.labels, job.labels);
}
