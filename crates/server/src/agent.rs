// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent-facing handlers: register, unregister, download, interrupt.

use crate::AppState;
use axum::body::{Body, Bytes};
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use cattery_wire::{AgentInfo, RegisterResponse, UnregisterReason, UnregisterRequest};
use tokio_util::io::ReaderStream;
use tracing::{info, warn};

/// `GET /agent/register/{id}`: drive Registering, issue the JIT config,
/// mark Registered, then hand the agent its one-shot runner credentials.
pub async fn register(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.manager().register_agent(&id).await {
        Ok(Some(issued)) => {
            info!(
                handler = "agent_register",
                agent_id = %id,
                runner_id = issued.jit.runner_id,
                "agent registered"
            );
            Json(RegisterResponse {
                agent: AgentInfo {
                    agent_id: issued.tray.id,
                    runner_id: issued.jit.runner_id,
                    shutdown: issued.shutdown,
                },
                jit_config: issued.jit.encoded_jit_config,
            })
            .into_response()
        }
        Ok(None) => {
            warn!(handler = "agent_register", agent_id = %id, "registration for unknown tray");
            StatusCode::NOT_FOUND.into_response()
        }
        Err(error) => {
            warn!(handler = "agent_register", agent_id = %id, %error, "registration failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// `POST /agent/unregister/{id}`: the agent is done (or was preempted);
/// tear the tray down. The body's reason is telemetry only.
pub async fn unregister(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    let reason = serde_json::from_slice::<UnregisterRequest>(&body)
        .map(|request| request.reason)
        .unwrap_or(UnregisterReason::Unknown);
    info!(handler = "agent_unregister", agent_id = %id, %reason, "agent unregistering");

    match state.manager().delete_tray(&id).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(error) => {
            warn!(handler = "agent_unregister", agent_id = %id, %error, "failed to delete tray");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// `POST /agent/interrupt/{id}`: external preemption. Teardown runs
/// after the response so the caller never waits on the provider.
pub async fn interrupt(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    info!(handler = "agent_interrupt", agent_id = %id, reason = %UnregisterReason::Preempted, "tray interrupted");

    let manager = state.manager_handle();
    tokio::spawn(async move {
        if let Err(error) = manager.delete_tray(&id).await {
            warn!(handler = "agent_interrupt", agent_id = %id, %error, "failed to delete tray");
        }
    });

    StatusCode::OK.into_response()
}

/// `GET /agent/download`: stream this binary for trays whose image does
/// not bundle it.
pub async fn download() -> Response {
    let path = match std::env::current_exe() {
        Ok(path) => path,
        Err(error) => {
            warn!(handler = "agent_download", %error, "cannot resolve own executable");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(error) => {
            warn!(handler = "agent_download", %error, "cannot open own executable");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "cattery".to_string());

    (
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{filename}\"")),
        ],
        Body::from_stream(ReaderStream::new(file)),
    )
        .into_response()
}
