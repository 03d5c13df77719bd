// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Installation-authenticated clients, one per organization.

use crate::{CredentialBroker, GithubError, JitRunnerConfig, WorkflowActions};
use async_trait::async_trait;
use cattery_config::GithubOrgConfig;
use cattery_core::Tray;
use jsonwebtoken::EncodingKey;
use octocrab::models::{AppId, InstallationId};
use octocrab::Octocrab;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Serialize)]
struct JitConfigRequest<'a> {
    name: &'a str,
    runner_group_id: i64,
    labels: &'a [String],
}

#[derive(Deserialize)]
struct JitConfigResponse {
    runner: JitRunner,
    encoded_jit_config: String,
}

#[derive(Deserialize)]
struct JitRunner {
    id: i64,
}

/// GitHub client scoped to one organization's App installation.
pub struct OrgClient {
    org: String,
    octocrab: Octocrab,
}

impl OrgClient {
    pub fn new(config: &GithubOrgConfig) -> Result<Self, GithubError> {
        let private_key = |reason: String| GithubError::PrivateKey {
            path: config.private_key_path.clone(),
            reason,
        };

        let pem = std::fs::read(&config.private_key_path)
            .map_err(|e| private_key(e.to_string()))?;
        let key = EncodingKey::from_rsa_pem(&pem).map_err(|e| private_key(e.to_string()))?;

        let octocrab = Octocrab::builder()
            .app(AppId(config.app_id), key)
            .build()?
            .installation(InstallationId(config.installation_id))?;

        Ok(Self { org: config.name.clone(), octocrab })
    }

    /// Create a just-in-time runner configuration.
    ///
    /// <https://docs.github.com/en/rest/actions/self-hosted-runners#create-configuration-for-a-just-in-time-runner-for-an-organization>
    pub async fn create_jit_config(
        &self,
        name: &str,
        runner_group_id: i64,
        labels: &[String],
    ) -> Result<JitRunnerConfig, GithubError> {
        let route = format!("/orgs/{}/actions/runners/generate-jitconfig", self.org);
        let response: JitConfigResponse = self
            .octocrab
            .post(route, Some(&JitConfigRequest { name, runner_group_id, labels }))
            .await?;

        info!(
            github_org = %self.org,
            runner_name = name,
            runner_id = response.runner.id,
            "issued jit runner config"
        );
        Ok(JitRunnerConfig {
            runner_id: response.runner.id,
            encoded_jit_config: response.encoded_jit_config,
        })
    }

    /// Remove an organization runner; 404 counts as success.
    pub async fn remove_runner(&self, runner_id: i64) -> Result<(), GithubError> {
        let route = format!("/orgs/{}/actions/runners/{}", self.org, runner_id);
        let response = self.octocrab._delete(route, None::<&()>).await?;

        match response.status().as_u16() {
            204 => Ok(()),
            404 => {
                debug!(github_org = %self.org, runner_id, "runner already removed");
                Ok(())
            }
            status => Err(GithubError::UnexpectedStatus { status, operation: "remove runner" }),
        }
    }

    /// Re-run the failed jobs of a workflow run.
    pub async fn rerun_failed_jobs(
        &self,
        repository: &str,
        workflow_run_id: i64,
    ) -> Result<(), GithubError> {
        let route = format!(
            "/repos/{}/{}/actions/runs/{}/rerun-failed-jobs",
            self.org, repository, workflow_run_id
        );
        let response = self.octocrab._post(route, None::<&()>).await?;

        match response.status().as_u16() {
            201 => Ok(()),
            status => {
                Err(GithubError::UnexpectedStatus { status, operation: "rerun failed jobs" })
            }
        }
    }
}

/// Per-organization client cache, built once at boot.
pub struct GithubOrgs {
    clients: HashMap<String, Arc<OrgClient>>,
}

impl GithubOrgs {
    pub fn from_config(orgs: &[GithubOrgConfig]) -> Result<Self, GithubError> {
        let mut clients = HashMap::new();
        for org in orgs {
            clients.insert(org.name.clone(), Arc::new(OrgClient::new(org)?));
        }
        Ok(Self { clients })
    }

    pub fn get(&self, org: &str) -> Result<Arc<OrgClient>, GithubError> {
        self.clients.get(org).cloned().ok_or_else(|| GithubError::UnknownOrg(org.to_string()))
    }
}

#[async_trait]
impl CredentialBroker for GithubOrgs {
    async fn issue(
        &self,
        tray: &Tray,
        runner_group_id: i64,
        labels: &[String],
    ) -> Result<JitRunnerConfig, GithubError> {
        let client = self.get(&tray.git_hub_org_name)?;
        client.create_jit_config(&tray.id, runner_group_id, labels).await
    }

    async fn revoke(&self, tray: &Tray) -> Result<(), GithubError> {
        if tray.git_hub_runner_id == 0 {
            // never registered, nothing to revoke
            return Ok(());
        }
        let client = self.get(&tray.git_hub_org_name)?;
        client.remove_runner(tray.git_hub_runner_id).await
    }
}

#[async_trait]
impl WorkflowActions for GithubOrgs {
    async fn rerun_failed_jobs(
        &self,
        org: &str,
        repository: &str,
        workflow_run_id: i64,
    ) -> Result<(), GithubError> {
        let client = self.get(org)?;
        client.rerun_failed_jobs(repository, workflow_run_id).await
    }
}
