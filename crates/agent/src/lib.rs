// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! cattery-agent: the binary side that runs inside a tray.
//!
//! Registers with the control plane, hands the returned JIT blob to the
//! runner binary, waits for it to finish, then unregisters.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;

use cattery_wire::UnregisterReason;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

pub use client::CatteryClient;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status} for {operation}")]
    UnexpectedStatus { status: u16, operation: &'static str },

    #[error("failed to start runner: {0}")]
    Runner(#[from] std::io::Error),
}

/// Arguments for `cattery agent`.
pub struct AgentOptions {
    /// Folder containing the runner distribution.
    pub runner_folder: PathBuf,
    /// Control plane base URL.
    pub server_url: String,
    /// Tray id this agent answers for.
    pub agent_id: String,
}

/// Register, run the runner to completion, unregister.
pub async fn run(options: AgentOptions) -> Result<(), AgentError> {
    let client = CatteryClient::new(&options.server_url);

    let registration = client.register(&options.agent_id).await?;
    info!(
        agent_id = %options.agent_id,
        runner_id = registration.agent.runner_id,
        "registered with control plane"
    );

    let listener = options.runner_folder.join("bin").join("Runner.Listener");
    let status = tokio::process::Command::new(&listener)
        .arg("run")
        .arg("--jitconfig")
        .arg(&registration.jit_config)
        .status()
        .await?;
    info!(agent_id = %options.agent_id, exit = ?status.code(), "runner finished");

    client.unregister(&registration.agent, UnregisterReason::Done).await?;

    if registration.agent.shutdown {
        shutdown_host().await;
    }

    Ok(())
}

/// Best-effort host power-off for single-use VM trays.
async fn shutdown_host() {
    info!("shutting down host");
    let result = tokio::process::Command::new("shutdown").args(["-h", "now"]).status().await;
    if let Err(error) = result {
        warn!(%error, "failed to shut down host");
    }
}
