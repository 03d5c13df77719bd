// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP client for the control plane's agent surface.

use crate::AgentError;
use cattery_wire::{AgentInfo, RegisterResponse, UnregisterReason, UnregisterRequest};

pub struct CatteryClient {
    http: reqwest::Client,
    base_url: String,
}

impl CatteryClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Request just-in-time runner credentials for this tray.
    pub async fn register(&self, agent_id: &str) -> Result<RegisterResponse, AgentError> {
        let url = format!("{}/agent/register/{}", self.base_url, agent_id);
        let response = self.http.get(url).send().await?;

        if !response.status().is_success() {
            return Err(AgentError::UnexpectedStatus {
                status: response.status().as_u16(),
                operation: "register",
            });
        }
        Ok(response.json().await?)
    }

    /// Tell the control plane this tray is finished.
    pub async fn unregister(
        &self,
        agent: &AgentInfo,
        reason: UnregisterReason,
    ) -> Result<(), AgentError> {
        let url = format!("{}/agent/unregister/{}", self.base_url, agent.agent_id);
        let body = UnregisterRequest { agent: agent.clone(), reason };
        let response = self.http.post(url).json(&body).send().await?;

        if !response.status().is_success() {
            return Err(AgentError::UnexpectedStatus {
                status: response.status().as_u16(),
                operation: "unregister",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
