// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recording doubles for the engine's trait seams.

use async_trait::async_trait;
use cattery_core::Tray;
use cattery_github::{CredentialBroker, GithubError, JitRunnerConfig, WorkflowActions};
use cattery_providers::{ProviderError, TrayProvider};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;

/// Provider double recording run/clean calls.
#[derive(Clone, Default)]
pub struct MockProvider {
    name: String,
    runs: Arc<Mutex<Vec<String>>>,
    cleans: Arc<Mutex<Vec<String>>>,
    fail_runs: Arc<AtomicBool>,
    clean_not_found: Arc<AtomicBool>,
}

impl MockProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    /// Tray ids passed to `run_tray`, in order.
    pub fn runs(&self) -> Vec<String> {
        self.runs.lock().clone()
    }

    /// Tray ids passed to `clean_tray`, in order.
    pub fn cleans(&self) -> Vec<String> {
        self.cleans.lock().clone()
    }

    /// Make every `run_tray` call fail.
    pub fn fail_runs(&self) {
        self.fail_runs.store(true, Ordering::SeqCst);
    }

    /// Make every `clean_tray` call report the compute already gone.
    pub fn clean_not_found(&self) {
        self.clean_not_found.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl TrayProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run_tray(&self, tray: &Tray) -> Result<(), ProviderError> {
        self.runs.lock().push(tray.id.clone());
        if self.fail_runs.load(Ordering::SeqCst) {
            return Err(ProviderError::Run("mock run failure".to_string()));
        }
        Ok(())
    }

    async fn clean_tray(&self, tray: &Tray) -> Result<(), ProviderError> {
        self.cleans.lock().push(tray.id.clone());
        if self.clean_not_found.load(Ordering::SeqCst) {
            return Err(ProviderError::NotFound);
        }
        Ok(())
    }
}

/// Broker double issuing sequential runner ids.
#[derive(Clone)]
pub struct MockBroker {
    next_runner_id: Arc<AtomicI64>,
    issues: Arc<Mutex<Vec<String>>>,
    revokes: Arc<Mutex<Vec<(String, i64)>>>,
}

impl Default for MockBroker {
    fn default() -> Self {
        Self {
            next_runner_id: Arc::new(AtomicI64::new(1000)),
            issues: Arc::new(Mutex::new(Vec::new())),
            revokes: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl MockBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tray ids credentials were issued for, in order.
    pub fn issues(&self) -> Vec<String> {
        self.issues.lock().clone()
    }

    /// `(tray_id, runner_id)` pairs revoked, in order.
    pub fn revokes(&self) -> Vec<(String, i64)> {
        self.revokes.lock().clone()
    }
}

#[async_trait]
impl CredentialBroker for MockBroker {
    async fn issue(
        &self,
        tray: &Tray,
        _runner_group_id: i64,
        _labels: &[String],
    ) -> Result<JitRunnerConfig, GithubError> {
        self.issues.lock().push(tray.id.clone());
        Ok(JitRunnerConfig {
            runner_id: self.next_runner_id.fetch_add(1, Ordering::SeqCst),
            encoded_jit_config: format!("jit-{}", tray.id),
        })
    }

    async fn revoke(&self, tray: &Tray) -> Result<(), GithubError> {
        if tray.git_hub_runner_id != 0 {
            self.revokes.lock().push((tray.id.clone(), tray.git_hub_runner_id));
        }
        Ok(())
    }
}

/// Workflow-actions double recording rerun requests.
#[derive(Clone, Default)]
pub struct MockActions {
    reruns: Arc<Mutex<Vec<(String, String, i64)>>>,
}

impl MockActions {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(org, repository, workflow_run_id)` reruns, in order.
    pub fn reruns(&self) -> Vec<(String, String, i64)> {
        self.reruns.lock().clone()
    }
}

#[async_trait]
impl WorkflowActions for MockActions {
    async fn rerun_failed_jobs(
        &self,
        org: &str,
        repository: &str,
        workflow_run_id: i64,
    ) -> Result<(), GithubError> {
        self.reruns.lock().push((org.to_string(), repository.to_string(), workflow_run_id));
        Ok(())
    }
}
