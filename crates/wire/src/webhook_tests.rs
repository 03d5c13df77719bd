// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

const WORKFLOW_JOB: &str = r#"{
    "action": "queued",
    "workflow_job": {
        "id": 100,
        "run_id": 9,
        "name": "build",
        "workflow_name": "ci",
        "labels": ["gpu"],
        "runner_name": null
    },
    "repository": { "name": "widgets" },
    "organization": { "login": "acme" }
}"#;

#[test]
fn decodes_workflow_job_event() {
    let event: WorkflowJobEvent = serde_json::from_str(WORKFLOW_JOB).unwrap();
    assert_eq!(event.action, "queued");
    assert_eq!(event.workflow_job.id, 100);
    assert_eq!(event.workflow_job.run_id, 9);
    assert_eq!(event.single_label(), Some("gpu"));
}

#[test]
fn multi_label_jobs_have_no_single_label() {
    let raw = WORKFLOW_JOB.replace(r#"["gpu"]"#, r#"["gpu", "linux"]"#);
    let event: WorkflowJobEvent = serde_json::from_str(&raw).unwrap();
    assert_eq!(event.single_label(), None);

    let raw = WORKFLOW_JOB.replace(r#"["gpu"]"#, "[]");
    let event: WorkflowJobEvent = serde_json::from_str(&raw).unwrap();
    assert_eq!(event.single_label(), None);
}

#[test]
fn to_job_copies_event_fields() {
    let event: WorkflowJobEvent = serde_json::from_str(WORKFLOW_JOB).unwrap();
    let now = chrono::Utc::now();
    let job = event.to_job("gpu", now);
    assert_eq!(job.id, 100);
    assert_eq!(job.workflow_id, 9);
    assert_eq!(job.repository, "widgets");
    assert_eq!(job.organization, "acme");
    assert_eq!(job.tray_type, "gpu");
    assert_eq!(job.runner_name, "");
    assert_eq!(job.created_at, now);
}

#[test]
fn decodes_workflow_run_event_without_conclusion() {
    let raw = r#"{
        "action": "requested",
        "workflow_run": { "id": 42 },
        "repository": { "name": "widgets" },
        "organization": { "login": "acme" }
    }"#;
    let event: WorkflowRunEvent = serde_json::from_str(raw).unwrap();
    assert_eq!(event.workflow_run.id, 42);
    assert!(event.workflow_run.conclusion.is_none());
}

#[test]
fn decodes_workflow_run_conclusion() {
    let raw = r#"{
        "action": "completed",
        "workflow_run": { "id": 42, "conclusion": "failure" },
        "repository": { "name": "widgets" },
        "organization": { "login": "acme" }
    }"#;
    let event: WorkflowRunEvent = serde_json::from_str(raw).unwrap();
    assert_eq!(event.workflow_run.conclusion.as_deref(), Some("failure"));
}
