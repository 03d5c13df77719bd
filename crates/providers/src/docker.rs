// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Container-engine backend: shells out to the `docker` CLI.

use crate::{ProviderError, TrayProvider};
use async_trait::async_trait;
use cattery_core::Tray;
use std::collections::HashMap;
use tokio::process::Command;
use tracing::{debug, info};

/// Runs each tray as a detached, self-removing container named after the
/// tray id. The agent inside the container finds the control plane through
/// `CATTERY_SERVER_URL` / `CATTERY_AGENT_ID`.
pub struct DockerProvider {
    name: String,
    advertise_url: String,
    /// Provider-level defaults (e.g. `image`); tray `provider_data` wins.
    options: HashMap<String, String>,
}

impl DockerProvider {
    pub fn new(
        name: impl Into<String>,
        advertise_url: impl Into<String>,
        options: HashMap<String, String>,
    ) -> Self {
        Self { name: name.into(), advertise_url: advertise_url.into(), options }
    }

    fn image_for(&self, tray: &Tray) -> Result<String, ProviderError> {
        tray.provider_data
            .get("image")
            .or_else(|| self.options.get("image"))
            .cloned()
            .ok_or_else(|| {
                ProviderError::Run(format!(
                    "no image configured for tray type '{}'",
                    tray.tray_type_name
                ))
            })
    }

    fn run_args(&self, tray: &Tray, image: &str) -> Vec<String> {
        vec![
            "run".to_string(),
            "-d".to_string(),
            "--rm".to_string(),
            "--name".to_string(),
            tray.id.clone(),
            "-e".to_string(),
            format!("CATTERY_SERVER_URL={}", self.advertise_url),
            "-e".to_string(),
            format!("CATTERY_AGENT_ID={}", tray.id),
            image.to_string(),
        ]
    }
}

#[async_trait]
impl TrayProvider for DockerProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run_tray(&self, tray: &Tray) -> Result<(), ProviderError> {
        let image = self.image_for(tray)?;
        let args = self.run_args(tray, &image);
        debug!(tray_id = %tray.id, %image, "starting container");

        let output = Command::new("docker")
            .args(&args)
            .output()
            .await
            .map_err(|e| ProviderError::Run(e.to_string()))?;

        if !output.status.success() {
            return Err(ProviderError::Run(String::from_utf8_lossy(&output.stderr).into_owned()));
        }

        info!(tray_id = %tray.id, provider = %self.name, "container started");
        Ok(())
    }

    async fn clean_tray(&self, tray: &Tray) -> Result<(), ProviderError> {
        let output = Command::new("docker")
            .args(["container", "stop", "--signal", "SIGINT", &tray.id])
            .output()
            .await
            .map_err(|e| ProviderError::Clean(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.contains("No such container") {
                return Err(ProviderError::NotFound);
            }
            return Err(ProviderError::Clean(stderr.into_owned()));
        }

        info!(tray_id = %tray.id, provider = %self.name, "container stopped");
        Ok(())
    }
}

#[cfg(test)]
#[path = "docker_tests.rs"]
mod tests;
