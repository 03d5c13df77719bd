// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cluster backend: runs each tray as a Kubernetes pod.

use crate::{ProviderError, TrayProvider};
use async_trait::async_trait;
use cattery_core::Tray;
use k8s_openapi::api::core::v1::{Container, EnvVar, Pod, PodSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::{Api, DeleteParams, PostParams};
use kube::Client;
use std::collections::{BTreeMap, HashMap};
use tracing::info;

/// Runs each tray as a single-container pod named after the tray id.
///
/// Pods never restart: a finished runner is reaped by the control plane,
/// not resurrected by the kubelet.
pub struct KubernetesProvider {
    name: String,
    namespace: String,
    advertise_url: String,
    client: Client,
    /// Provider-level defaults (e.g. `image`); tray `provider_data` wins.
    options: HashMap<String, String>,
}

impl KubernetesProvider {
    /// Connect using the ambient kubeconfig / in-cluster environment.
    pub async fn new(
        name: impl Into<String>,
        advertise_url: impl Into<String>,
        options: HashMap<String, String>,
    ) -> Result<Self, ProviderError> {
        let name = name.into();
        let client = Client::try_default().await.map_err(|e| ProviderError::Construct {
            name: name.clone(),
            reason: format!("failed to create kube client: {e}"),
        })?;
        let namespace =
            options.get("namespace").cloned().unwrap_or_else(|| "default".to_string());
        Ok(Self { name, namespace, advertise_url: advertise_url.into(), client, options })
    }

    fn pods(&self) -> Api<Pod> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }

    fn build_pod(&self, tray: &Tray, image: &str) -> Pod {
        let labels = BTreeMap::from([
            ("app.kubernetes.io/managed-by".to_string(), "cattery".to_string()),
            ("cattery/tray-type".to_string(), tray.tray_type_name.clone()),
        ]);

        let env = vec![
            EnvVar {
                name: "CATTERY_SERVER_URL".to_string(),
                value: Some(self.advertise_url.clone()),
                ..Default::default()
            },
            EnvVar {
                name: "CATTERY_AGENT_ID".to_string(),
                value: Some(tray.id.clone()),
                ..Default::default()
            },
        ];

        Pod {
            metadata: ObjectMeta {
                name: Some(tray.id.clone()),
                labels: Some(labels),
                ..Default::default()
            },
            spec: Some(PodSpec {
                restart_policy: Some("Never".to_string()),
                containers: vec![Container {
                    name: "runner".to_string(),
                    image: Some(image.to_string()),
                    env: Some(env),
                    ..Default::default()
                }],
                ..Default::default()
            }),
            ..Default::default()
        }
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
}

#[async_trait]
impl TrayProvider for KubernetesProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run_tray(&self, tray: &Tray) -> Result<(), ProviderError> {
        let image = self.image_for(tray)?;
        let pod = self.build_pod(tray, &image);

        self.pods()
            .create(&PostParams::default(), &pod)
            .await
            .map_err(|e| ProviderError::Run(format!("pod creation failed: {e}")))?;

        info!(
            tray_id = %tray.id,
            provider = %self.name,
            namespace = %self.namespace,
            "pod created"
        );
        Ok(())
    }

    async fn clean_tray(&self, tray: &Tray) -> Result<(), ProviderError> {
        match self.pods().delete(&tray.id, &DeleteParams::default()).await {
            Ok(_) => {
                info!(tray_id = %tray.id, provider = %self.name, "pod deleted");
                Ok(())
            }
            Err(kube::Error::Api(response)) if response.code == 404 => {
                Err(ProviderError::NotFound)
            }
            Err(e) => Err(ProviderError::Clean(format!("pod deletion failed: {e}"))),
        }
    }
}
