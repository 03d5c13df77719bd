// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Provider discovery and caching.

use crate::{DockerProvider, KubernetesProvider, ProviderError, TrayProvider};
use cattery_config::ProviderConfig;
use std::collections::HashMap;
use std::sync::Arc;

/// Name → provider map built once at boot and read-only afterwards.
///
/// Eager construction doubles as validation: a provider that cannot be
/// built (unknown type, unreachable cluster) aborts startup instead of
/// failing the first tray.
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn TrayProvider>>,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.providers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ProviderRegistry {
    pub async fn from_config(
        configs: &[ProviderConfig],
        advertise_url: &str,
    ) -> Result<Self, ProviderError> {
        let mut providers: HashMap<String, Arc<dyn TrayProvider>> = HashMap::new();

        for config in configs {
            let provider: Arc<dyn TrayProvider> = match config.provider_type.as_str() {
                "docker" => Arc::new(DockerProvider::new(
                    &config.name,
                    advertise_url,
                    config.options.clone(),
                )),
                "kubernetes" => Arc::new(
                    KubernetesProvider::new(&config.name, advertise_url, config.options.clone())
                        .await?,
                ),
                other => return Err(ProviderError::UnknownType(other.to_string())),
            };
            providers.insert(config.name.clone(), provider);
        }

        Ok(Self { providers })
    }

    /// Build a registry from pre-constructed providers (tests).
    pub fn from_providers(
        providers: impl IntoIterator<Item = (String, Arc<dyn TrayProvider>)>,
    ) -> Self {
        Self { providers: providers.into_iter().collect() }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn TrayProvider>> {
        self.providers.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
