// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! cattery-github: per-organization GitHub App clients.
//!
//! One installation-authenticated client per configured organization,
//! built at boot and cached. The engine talks to GitHub only through the
//! [`CredentialBroker`] and [`WorkflowActions`] seams so tests can swap in
//! doubles.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod signature;

use async_trait::async_trait;
use cattery_core::Tray;
use thiserror::Error;

pub use client::{GithubOrgs, OrgClient};
pub use signature::verify_signature;

#[derive(Debug, Error)]
pub enum GithubError {
    #[error("no github client configured for org '{0}'")]
    UnknownOrg(String),

    #[error("failed to load private key {path}: {reason}")]
    PrivateKey { path: String, reason: String },

    #[error("github api error: {0}")]
    Api(#[from] octocrab::Error),

    #[error("github api returned {status} during {operation}")]
    UnexpectedStatus { status: u16, operation: &'static str },
}

/// A just-in-time runner registration issued for one tray.
#[derive(Debug, Clone, PartialEq)]
pub struct JitRunnerConfig {
    pub runner_id: i64,
    /// Opaque base64 blob the agent hands to the runner binary.
    pub encoded_jit_config: String,
}

/// Issues and revokes one-shot runner credentials.
#[async_trait]
pub trait CredentialBroker: Send + Sync {
    /// Create a JIT runner configuration in the tray's organization. The
    /// runner registers under the tray id exactly once.
    async fn issue(
        &self,
        tray: &Tray,
        runner_group_id: i64,
        labels: &[String],
    ) -> Result<JitRunnerConfig, GithubError>;

    /// Remove the tray's organization runner. A runner that is already
    /// gone counts as revoked.
    async fn revoke(&self, tray: &Tray) -> Result<(), GithubError>;
}

/// Workflow-level operations used by the restarter.
#[async_trait]
pub trait WorkflowActions: Send + Sync {
    async fn rerun_failed_jobs(
        &self,
        org: &str,
        repository: &str,
        workflow_run_id: i64,
    ) -> Result<(), GithubError>;
}

#[async_trait]
impl<T: CredentialBroker + ?Sized> CredentialBroker for std::sync::Arc<T> {
    async fn issue(
        &self,
        tray: &Tray,
        runner_group_id: i64,
        labels: &[String],
    ) -> Result<JitRunnerConfig, GithubError> {
        (**self).issue(tray, runner_group_id, labels).await
    }

    async fn revoke(&self, tray: &Tray) -> Result<(), GithubError> {
        (**self).revoke(tray).await
    }
}

#[async_trait]
impl<T: WorkflowActions + ?Sized> WorkflowActions for std::sync::Arc<T> {
    async fn rerun_failed_jobs(
        &self,
        org: &str,
        repository: &str,
        workflow_run_id: i64,
    ) -> Result<(), GithubError> {
        (**self).rerun_failed_jobs(org, repository, workflow_run_id).await
    }
}
