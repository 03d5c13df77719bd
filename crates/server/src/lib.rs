// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! cattery-server: the control plane's HTTP surface and bootstrap.
//!
//! Two route groups share one axum router: the GitHub webhook intake
//! (`POST /github/{org}`) and the agent protocol (`/agent/...`).

mod agent;
mod bootstrap;
mod state;
mod webhook;

use axum::routing::{get, post};
use axum::Router;
use thiserror::Error;

pub use bootstrap::run;
pub use state::AppState;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Store(#[from] cattery_store::StoreError),

    #[error(transparent)]
    Github(#[from] cattery_github::GithubError),

    #[error(transparent)]
    Provider(#[from] cattery_providers::ProviderError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("http server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Build the control plane router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async {}))
        .route("/github/{org}", post(webhook::github_webhook))
        .route("/agent/register/{id}", get(agent::register))
        .route("/agent/unregister/{id}", post(agent::unregister))
        .route("/agent/download", get(agent::download))
        .route("/agent/interrupt/{id}", post(agent::interrupt))
        .with_state(state)
}
