// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared handler state.

use async_trait::async_trait;
use cattery_config::AppConfig;
use cattery_engine::{QueueCounts, TrayManager, WorkflowRestarter};
use cattery_github::GithubOrgs;
use cattery_queue::QueueManager;
use cattery_store::{MongoRestartLedger, MongoTrayStore};
use std::collections::HashMap;
use std::sync::Arc;

/// Concrete manager wiring used by the running server.
pub type Manager = TrayManager<MongoTrayStore, Arc<GithubOrgs>>;
pub type Restarter = WorkflowRestarter<MongoRestartLedger, Arc<GithubOrgs>>;

struct Inner {
    config: AppConfig,
    manager: Arc<Manager>,
    restarter: Arc<Restarter>,
    queue: Arc<QueueManager>,
}

/// Cheap-to-clone handle shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        manager: Arc<Manager>,
        restarter: Arc<Restarter>,
        queue: Arc<QueueManager>,
    ) -> Self {
        Self { inner: Arc::new(Inner { config, manager, restarter, queue }) }
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn manager(&self) -> &Manager {
        &self.inner.manager
    }

    /// Owning handle for work that outlives the request.
    pub fn manager_handle(&self) -> Arc<Manager> {
        self.inner.manager.clone()
    }

    pub fn restarter(&self) -> &Restarter {
        &self.inner.restarter
    }

    pub fn queue(&self) -> &QueueManager {
        &self.inner.queue
    }
}

/// Bridges the queue manager into the engine's reconcile loop.
pub struct QueueCountsAdapter(pub Arc<QueueManager>);

#[async_trait]
impl QueueCounts for QueueCountsAdapter {
    async fn jobs_count(&self) -> HashMap<String, usize> {
        self.0.jobs_count().await
    }
}
