// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory store doubles for tests.
//!
//! Behavior mirrors the Mongo implementations (post-image semantics,
//! zero-field preservation, reclaim preference order) with an injected
//! clock so staleness windows are controllable.

use crate::{RestartLedger, StatusCounts, StoreError, TrayStore};
use async_trait::async_trait;
use cattery_core::{Clock, SystemClock, Tray, TrayStatus};
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

const REDUNDANT_ORDER: [TrayStatus; 3] =
    [TrayStatus::Creating, TrayStatus::Registering, TrayStatus::Registered];

/// Map-backed [`TrayStore`].
#[derive(Clone)]
pub struct InMemoryTrayStore<C: Clock = SystemClock> {
    trays: Arc<Mutex<HashMap<String, Tray>>>,
    clock: C,
}

impl InMemoryTrayStore<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for InMemoryTrayStore<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> InMemoryTrayStore<C> {
    pub fn with_clock(clock: C) -> Self {
        Self { trays: Arc::new(Mutex::new(HashMap::new())), clock }
    }

    /// Snapshot of every stored tray, sorted by id for stable assertions.
    pub fn all(&self) -> Vec<Tray> {
        let mut trays: Vec<Tray> = self.trays.lock().values().cloned().collect();
        trays.sort_by(|a, b| a.id.cmp(&b.id));
        trays
    }

    pub fn len(&self) -> usize {
        self.trays.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.trays.lock().is_empty()
    }
}

#[async_trait]
impl<C: Clock> TrayStore for InMemoryTrayStore<C> {
    async fn get_by_id(&self, tray_id: &str) -> Result<Option<Tray>, StoreError> {
        Ok(self.trays.lock().get(tray_id).cloned())
    }

    async fn save(&self, tray: &Tray) -> Result<(), StoreError> {
        let mut tray = tray.clone();
        tray.status_changed = self.clock.now_utc();
        self.trays.lock().insert(tray.id.clone(), tray);
        Ok(())
    }

    async fn update_status(
        &self,
        tray_id: &str,
        status: TrayStatus,
        job_run_id: i64,
        workflow_run_id: i64,
        runner_id: i64,
    ) -> Result<Option<Tray>, StoreError> {
        let mut trays = self.trays.lock();
        let Some(tray) = trays.get_mut(tray_id) else {
            return Ok(None);
        };
        tray.status = status;
        tray.status_changed = self.clock.now_utc();
        if job_run_id != 0 {
            tray.job_run_id = job_run_id;
        }
        if workflow_run_id != 0 {
            tray.workflow_run_id = workflow_run_id;
        }
        if runner_id != 0 {
            tray.git_hub_runner_id = runner_id;
        }
        Ok(Some(tray.clone()))
    }

    async fn delete(&self, tray_id: &str) -> Result<(), StoreError> {
        self.trays.lock().remove(tray_id);
        Ok(())
    }

    async fn count_by_tray_type(
        &self,
        tray_type: &str,
    ) -> Result<(StatusCounts, usize), StoreError> {
        let mut counts: StatusCounts = TrayStatus::ALL.iter().map(|s| (*s, 0)).collect();
        let mut total = 0;
        for tray in self.trays.lock().values() {
            if tray.tray_type_name == tray_type {
                *counts.entry(tray.status).or_insert(0) += 1;
                total += 1;
            }
        }
        Ok((counts, total))
    }

    async fn mark_redundant(
        &self,
        tray_type: &str,
        limit: usize,
    ) -> Result<Vec<Tray>, StoreError> {
        let mut trays = self.trays.lock();
        let mut claimed = Vec::new();

        for status in REDUNDANT_ORDER {
            let mut ids: Vec<String> = trays
                .values()
                .filter(|t| t.tray_type_name == tray_type && t.status == status)
                .map(|t| t.id.clone())
                .collect();
            ids.sort();

            for id in ids {
                if claimed.len() >= limit {
                    return Ok(claimed);
                }
                if let Some(tray) = trays.get_mut(&id) {
                    tray.status = TrayStatus::Deleting;
                    tray.status_changed = self.clock.now_utc();
                    tray.job_run_id = 0;
                    claimed.push(tray.clone());
                }
            }
        }

        Ok(claimed)
    }

    async fn get_stale(
        &self,
        threshold: Duration,
        running_threshold: Duration,
    ) -> Result<Vec<Tray>, StoreError> {
        let now = self.clock.now_utc();
        let idle_cutoff = now - threshold;
        let running_cutoff = now - running_threshold;

        let mut stale: Vec<Tray> = self
            .trays
            .lock()
            .values()
            .filter(|t| match t.status {
                TrayStatus::Running => t.status_changed <= running_cutoff,
                _ => t.status_changed <= idle_cutoff,
            })
            .cloned()
            .collect();
        stale.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(stale)
    }
}

/// Map-backed [`RestartLedger`].
#[derive(Clone, Default)]
pub struct InMemoryRestartLedger {
    requests: Arc<Mutex<HashMap<i64, DateTime<Utc>>>>,
}

impl InMemoryRestartLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.lock().is_empty()
    }
}

#[async_trait]
impl RestartLedger for InMemoryRestartLedger {
    async fn save_restart_request(&self, workflow_run_id: i64) -> Result<(), StoreError> {
        self.requests.lock().insert(workflow_run_id, Utc::now());
        Ok(())
    }

    async fn delete_restart_request(&self, workflow_run_id: i64) -> Result<(), StoreError> {
        self.requests.lock().remove(&workflow_run_id);
        Ok(())
    }

    async fn check_restart_request(&self, workflow_run_id: i64) -> Result<bool, StoreError> {
        Ok(self.requests.lock().contains_key(&workflow_run_id))
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
