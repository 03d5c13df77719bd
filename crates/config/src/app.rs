// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Application config schema, loading, and validation.

use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use thiserror::Error;

/// Config file location when `--config-path` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/cattery/config.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ServerConfig {
    /// Address the HTTP server binds, e.g. `0.0.0.0:5137`.
    pub listen_address: String,
    /// URL trays use to reach this control plane.
    pub advertise_url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DatabaseConfig {
    pub uri: String,
    pub database: String,
}

/// One GitHub organization this control plane serves.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GithubOrgConfig {
    pub name: String,
    pub app_id: u64,
    pub installation_id: u64,
    /// Shared secret for webhook HMAC verification.
    pub webhook_secret: String,
    pub private_key_path: String,
}

/// A configured provider backend instance.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    pub name: String,
    /// Backend kind: `docker` or `kubernetes`.
    #[serde(rename = "type")]
    pub provider_type: String,
    /// Backend-specific settings (image defaults, namespace, ...).
    #[serde(flatten, default)]
    pub options: HashMap<String, String>,
}

/// Provisioning template matched by a single job label.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TrayType {
    pub name: String,
    pub provider: String,
    pub runner_group_id: i64,
    /// Whether the agent should shut the host down after its job.
    #[serde(default)]
    pub shutdown: bool,
    pub github_org: String,
    /// Hard cap on live trays of this type.
    #[serde(rename = "limit")]
    pub max_trays: usize,
    /// Provider-specific settings for trays of this type.
    #[serde(default)]
    pub config: HashMap<String, String>,
    /// Free-form metadata handed through to the provider.
    #[serde(default)]
    pub extra_metadata: HashMap<String, String>,
}

impl TrayType {
    /// Provider scratch seeded into each new tray: type config plus
    /// extra metadata, with config keys winning on collision.
    pub fn provider_data(&self) -> HashMap<String, String> {
        let mut data = self.extra_metadata.clone();
        data.extend(self.config.iter().map(|(k, v)| (k.clone(), v.clone())));
        data
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub github: Vec<GithubOrgConfig>,
    pub providers: Vec<ProviderConfig>,
    pub tray_types: Vec<TrayType>,
}

impl AppConfig {
    /// Load and validate the config file.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&raw)
    }

    /// Parse and validate config from a YAML string.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_yaml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Look up a tray type by name.
    pub fn tray_type(&self, name: &str) -> Option<&TrayType> {
        self.tray_types.iter().find(|t| t.name == name)
    }

    /// Look up an organization's config by name.
    pub fn org(&self, name: &str) -> Option<&GithubOrgConfig> {
        self.github.iter().find(|o| o.name == name)
    }

    /// Resolve a job label to a tray type scoped to the event's org.
    pub fn tray_type_for_label(&self, label: &str, org: &str) -> Option<&TrayType> {
        self.tray_types.iter().find(|t| t.name == label && t.github_org == org)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if self.server.listen_address.is_empty() {
            return invalid("server.listenAddress must not be empty".into());
        }
        if self.server.advertise_url.is_empty() {
            return invalid("server.advertiseUrl must not be empty".into());
        }
        if self.database.uri.is_empty() || self.database.database.is_empty() {
            return invalid("database.uri and database.database must not be empty".into());
        }

        let mut org_names = HashSet::new();
        for org in &self.github {
            if org.name.is_empty() {
                return invalid("github org name must not be empty".into());
            }
            if !org_names.insert(org.name.as_str()) {
                return invalid(format!("duplicate github org '{}'", org.name));
            }
            if org.app_id == 0 || org.installation_id == 0 {
                return invalid(format!(
                    "github org '{}' needs appId and installationId",
                    org.name
                ));
            }
            if org.webhook_secret.is_empty() {
                return invalid(format!("github org '{}' needs a webhookSecret", org.name));
            }
            if org.private_key_path.is_empty() {
                return invalid(format!("github org '{}' needs a privateKeyPath", org.name));
            }
        }

        let mut provider_names = HashSet::new();
        for provider in &self.providers {
            if provider.name.is_empty() || provider.provider_type.is_empty() {
                return invalid("provider entries need a name and a type".into());
            }
            if !provider_names.insert(provider.name.as_str()) {
                return invalid(format!("duplicate provider '{}'", provider.name));
            }
        }

        let mut type_names = HashSet::new();
        for tray_type in &self.tray_types {
            if tray_type.name.is_empty() {
                return invalid("trayType name must not be empty".into());
            }
            if !type_names.insert(tray_type.name.as_str()) {
                return invalid(format!("duplicate trayType '{}'", tray_type.name));
            }
            if !provider_names.contains(tray_type.provider.as_str()) {
                return invalid(format!(
                    "trayType '{}' references unknown provider '{}'",
                    tray_type.name, tray_type.provider
                ));
            }
            if !org_names.contains(tray_type.github_org.as_str()) {
                return invalid(format!(
                    "trayType '{}' references unknown github org '{}'",
                    tray_type.name, tray_type.github_org
                ));
            }
            if tray_type.max_trays == 0 {
                return invalid(format!("trayType '{}' needs a limit above zero", tray_type.name));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "app_tests.rs"]
mod tests;
