// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Restart-on-failure for workflow runs.

use crate::EngineError;
use cattery_github::WorkflowActions;
use cattery_store::RestartLedger;
use tracing::{debug, info};

/// Consults the persisted restart ledger when workflow runs complete.
pub struct WorkflowRestarter<L, A> {
    ledger: L,
    actions: A,
}

impl<L, A> WorkflowRestarter<L, A>
where
    L: RestartLedger,
    A: WorkflowActions,
{
    pub fn new(ledger: L, actions: A) -> Self {
        Self { ledger, actions }
    }

    /// Record intent to rerun this run's failed jobs when it next fails.
    pub async fn request_restart(&self, workflow_run_id: i64) -> Result<(), EngineError> {
        self.ledger.save_restart_request(workflow_run_id).await?;
        Ok(())
    }

    /// A run completed with a failure conclusion: rerun its failed jobs if
    /// a restart was requested. Returns whether a rerun was triggered; the
    /// request is consumed only after the provider acknowledged the rerun.
    pub async fn restart(
        &self,
        workflow_run_id: i64,
        org: &str,
        repository: &str,
    ) -> Result<bool, EngineError> {
        if !self.ledger.check_restart_request(workflow_run_id).await? {
            debug!(workflow_run_id, "no restart request for workflow run");
            return Ok(false);
        }

        self.actions.rerun_failed_jobs(org, repository, workflow_run_id).await?;
        self.ledger.delete_restart_request(workflow_run_id).await?;
        info!(workflow_run_id, github_org = org, repository, "reran failed jobs");
        Ok(true)
    }

    /// A run reached a non-restartable terminal state: drop any request.
    pub async fn cleanup(&self, workflow_run_id: i64) -> Result<(), EngineError> {
        self.ledger.delete_restart_request(workflow_run_id).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "restarter_tests.rs"]
mod tests;
