// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! GitHub webhook intake: signature check, then event dispatch.

use crate::AppState;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use cattery_core::JobStatus;
use cattery_github::verify_signature;
use cattery_queue::QueueError;
use cattery_wire::{WorkflowJobEvent, WorkflowRunEvent};
use chrono::Utc;
use tracing::{debug, info, warn};

const SIGNATURE_HEADER: &str = "x-hub-signature-256";
const EVENT_HEADER: &str = "x-github-event";

/// `POST /github/{org}`: every payload must carry a valid per-org HMAC.
pub async fn github_webhook(
    State(state): State<AppState>,
    Path(org): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(org_config) = state.config().org(&org) else {
        warn!(handler = "webhook", github_org = %org, "webhook for unknown organization");
        return StatusCode::BAD_REQUEST.into_response();
    };

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if !verify_signature(&org_config.webhook_secret, &body, signature) {
        warn!(handler = "webhook", github_org = %org, "webhook signature mismatch");
        return StatusCode::BAD_REQUEST.into_response();
    }

    let event = headers
        .get(EVENT_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    match event {
        "workflow_job" => workflow_job(&state, &org, &body).await,
        "workflow_run" => workflow_run(&state, &org, &body).await,
        other => {
            debug!(handler = "webhook", github_org = %org, event = other, "ignoring event");
            StatusCode::OK.into_response()
        }
    }
}

async fn workflow_job(state: &AppState, org: &str, body: &[u8]) -> Response {
    let event: WorkflowJobEvent = match serde_json::from_slice(body) {
        Ok(event) => event,
        Err(error) => {
            warn!(handler = "webhook", github_org = %org, %error, "malformed workflow_job payload");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    let job_id = event.workflow_job.id;
    match event.action.as_str() {
        "queued" => {
            // Only single-label jobs whose label names a tray type of this
            // org are ours; everything else is silently ignored.
            let Some(tray_type) = event
                .single_label()
                .and_then(|label| state.config().tray_type_for_label(label, org))
            else {
                debug!(handler = "webhook", github_org = %org, job_id, "job labels match no tray type");
                return StatusCode::OK.into_response();
            };

            let job = event.to_job(&tray_type.name, Utc::now());
            if let Err(error) = state.queue().add_job(&job).await {
                warn!(handler = "webhook", github_org = %org, job_id, %error, "failed to enqueue job");
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
            info!(
                handler = "webhook",
                github_org = %org,
                job_id,
                tray_type = %tray_type.name,
                "job queued"
            );
            StatusCode::OK.into_response()
        }
        "in_progress" => {
            match state.queue().job_in_progress(job_id).await {
                Ok(()) => {}
                // a job we never queued started somewhere else; not ours
                Err(QueueError::NotFound(_)) => {
                    debug!(handler = "webhook", github_org = %org, job_id, "in_progress for unqueued job");
                }
                Err(error) => {
                    warn!(handler = "webhook", github_org = %org, job_id, %error, "failed to drop job");
                    return StatusCode::INTERNAL_SERVER_ERROR.into_response();
                }
            }

            let Some(runner_name) = event.workflow_job.runner_name.as_deref() else {
                warn!(handler = "webhook", github_org = %org, job_id, "in_progress without runner name");
                return StatusCode::OK.into_response();
            };
            match state.manager().set_job(runner_name, job_id, event.workflow_job.run_id).await {
                // a missing tray was already logged and dropped
                Ok(_) => StatusCode::OK.into_response(),
                Err(error) => {
                    warn!(handler = "webhook", github_org = %org, tray_id = runner_name, %error, "failed to assign job");
                    StatusCode::INTERNAL_SERVER_ERROR.into_response()
                }
            }
        }
        "completed" => {
            // drop the job if it never reported in_progress (cancelled while
            // queued); missing entries are fine
            if let Err(error) = state.queue().update_job_status(job_id, JobStatus::Finished).await
            {
                if !matches!(error, QueueError::NotFound(_)) {
                    warn!(handler = "webhook", github_org = %org, job_id, %error, "failed to drop finished job");
                }
            }

            let Some(runner_name) = event.workflow_job.runner_name.as_deref() else {
                debug!(handler = "webhook", github_org = %org, job_id, "completed without runner name");
                return StatusCode::OK.into_response();
            };
            match state.manager().delete_tray(runner_name).await {
                Ok(()) => StatusCode::OK.into_response(),
                Err(error) => {
                    warn!(handler = "webhook", github_org = %org, tray_id = runner_name, %error, "failed to delete tray");
                    StatusCode::INTERNAL_SERVER_ERROR.into_response()
                }
            }
        }
        other => {
            debug!(handler = "webhook", github_org = %org, job_id, action = other, "ignoring action");
            StatusCode::OK.into_response()
        }
    }
}

async fn workflow_run(state: &AppState, org: &str, body: &[u8]) -> Response {
    let event: WorkflowRunEvent = match serde_json::from_slice(body) {
        Ok(event) => event,
        Err(error) => {
            warn!(handler = "webhook", github_org = %org, %error, "malformed workflow_run payload");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    if event.action != "completed" {
        return StatusCode::OK.into_response();
    }

    let run_id = event.workflow_run.id;
    let result = match event.workflow_run.conclusion.as_deref() {
        Some("failure") => {
            state.restarter().restart(run_id, org, &event.repository.name).await.map(|_| ())
        }
        // any other terminal conclusion retires a pending request
        Some(_) => state.restarter().cleanup(run_id).await,
        None => Ok(()),
    };

    match result {
        Ok(()) => StatusCode::OK.into_response(),
        Err(error) => {
            warn!(handler = "webhook", github_org = %org, workflow_run_id = run_id, %error, "failed to process workflow_run");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
