// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tray lifecycle state machine and reconciliation.

use crate::EngineError;
use cattery_config::TrayType;
use cattery_core::{Tray, TrayStatus};
use cattery_github::{CredentialBroker, JitRunnerConfig};
use cattery_providers::{ProviderError, ProviderRegistry, TrayProvider};
use cattery_store::TrayStore;
use chrono::Duration;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Non-Running trays whose last transition is older than this are reaped.
pub(crate) fn stale_after() -> Duration {
    Duration::minutes(5)
}

/// Running trays are only reaped past this longer window, as a safety net
/// against orphaned execution.
pub(crate) fn running_stale_after() -> Duration {
    Duration::minutes(10)
}

/// Everything the agent surface needs to answer a successful registration.
pub struct IssuedRegistration {
    pub tray: Tray,
    pub jit: JitRunnerConfig,
    /// Whether the agent should power the host down after its job.
    pub shutdown: bool,
}

/// Owns the tray state machine.
///
/// Every mutation funnels through the store's conditional `update_status`,
/// so concurrent transitions against the same tray serialize in the
/// database and stale writers observe `None` instead of clobbering newer
/// state.
pub struct TrayManager<S, B> {
    store: S,
    broker: B,
    registry: Arc<ProviderRegistry>,
    tray_types: HashMap<String, TrayType>,
}

impl<S, B> TrayManager<S, B>
where
    S: TrayStore,
    B: CredentialBroker,
{
    pub fn new(
        store: S,
        broker: B,
        registry: Arc<ProviderRegistry>,
        tray_types: impl IntoIterator<Item = TrayType>,
    ) -> Self {
        Self {
            store,
            broker,
            registry,
            tray_types: tray_types.into_iter().map(|t| (t.name.clone(), t)).collect(),
        }
    }

    pub fn tray_type(&self, name: &str) -> Result<&TrayType, EngineError> {
        self.tray_types.get(name).ok_or_else(|| EngineError::UnknownTrayType(name.to_string()))
    }

    fn provider_for(&self, tray_type: &TrayType) -> Result<Arc<dyn TrayProvider>, EngineError> {
        self.registry.get(&tray_type.provider).ok_or_else(|| EngineError::UnknownProvider {
            tray_type: tray_type.name.clone(),
            provider: tray_type.provider.clone(),
        })
    }

    /// Provision a new tray of the given type.
    ///
    /// The record is persisted before the provider call; if the provider
    /// fails the tray stays `Creating` and the stale reaper cleans it up.
    pub async fn create_tray(&self, type_name: &str) -> Result<Tray, EngineError> {
        let tray_type = self.tray_type(type_name)?;
        let provider = self.provider_for(tray_type)?;

        let tray = Tray::new(&tray_type.name, &tray_type.github_org, tray_type.provider_data());
        self.store.save(&tray).await?;

        info!(
            tray_id = %tray.id,
            tray_type = type_name,
            provider = provider.name(),
            "creating tray"
        );

        if let Err(e) = provider.run_tray(&tray).await {
            error!(tray_id = %tray.id, provider = provider.name(), error = %e, "failed to run tray");
            return Err(e.into());
        }

        Ok(tray)
    }

    /// An agent booted and asked to register.
    pub async fn registering(&self, tray_id: &str) -> Result<Option<Tray>, EngineError> {
        Ok(self.store.update_status(tray_id, TrayStatus::Registering, 0, 0, 0).await?)
    }

    /// Credentials were issued; remember the assigned runner id.
    pub async fn registered(
        &self,
        tray_id: &str,
        runner_id: i64,
    ) -> Result<Option<Tray>, EngineError> {
        Ok(self.store.update_status(tray_id, TrayStatus::Registered, 0, 0, runner_id).await?)
    }

    /// Drive the full registration handshake for an agent.
    ///
    /// Returns `None` when the tray is unknown (the agent is answering for
    /// a tray that has already been reaped).
    pub async fn register_agent(
        &self,
        tray_id: &str,
    ) -> Result<Option<IssuedRegistration>, EngineError> {
        let Some(tray) = self.registering(tray_id).await? else {
            return Ok(None);
        };

        let tray_type = self.tray_type(&tray.tray_type_name)?;
        let labels = vec![tray_type.name.clone()];
        let jit = self.broker.issue(&tray, tray_type.runner_group_id, &labels).await?;

        let Some(tray) = self.registered(tray_id, jit.runner_id).await? else {
            return Ok(None);
        };

        Ok(Some(IssuedRegistration { shutdown: tray_type.shutdown, tray, jit }))
    }

    /// A job started running on this tray.
    ///
    /// A missing tray means a terminal transition won a webhook race; the
    /// event is dropped with a warning.
    pub async fn set_job(
        &self,
        tray_id: &str,
        job_run_id: i64,
        workflow_run_id: i64,
    ) -> Result<Option<Tray>, EngineError> {
        let updated = self
            .store
            .update_status(tray_id, TrayStatus::Running, job_run_id, workflow_run_id, 0)
            .await?;
        if updated.is_none() {
            warn!(tray_id, job_run_id, "tray not found, dropping job assignment");
        }
        Ok(updated)
    }

    /// Tear a tray down: revoke credentials, clean the compute, drop the
    /// record. Idempotent: a tray that is already gone is a no-op, and
    /// redelivered events cannot trigger a second provider clean.
    pub async fn delete_tray(&self, tray_id: &str) -> Result<(), EngineError> {
        let Some(tray) = self.store.update_status(tray_id, TrayStatus::Deleting, 0, 0, 0).await?
        else {
            debug!(tray_id, "tray already gone, nothing to delete");
            return Ok(());
        };

        self.broker.revoke(&tray).await?;

        let tray_type = self.tray_type(&tray.tray_type_name)?;
        let provider = self.provider_for(tray_type)?;
        match provider.clean_tray(&tray).await {
            Ok(()) => {}
            // the compute is already gone, which is what we wanted
            Err(ProviderError::NotFound) => {
                debug!(tray_id, provider = provider.name(), "tray already cleaned at provider");
            }
            Err(e) => {
                error!(tray_id, provider = provider.name(), error = %e, "failed to clean tray");
                return Err(e.into());
            }
        }

        self.store.delete(tray_id).await?;
        info!(tray_id, tray_type = %tray.tray_type_name, "tray deleted");
        Ok(())
    }

    /// One reconcile pass over a queue-count snapshot.
    ///
    /// Per-type failures are logged and never break the pass; a snapshot
    /// entry whose type is not configured is skipped with a warning.
    pub async fn handle_jobs_queue(&self, counts: &HashMap<String, usize>) {
        for (type_name, queued) in counts {
            if !self.tray_types.contains_key(type_name) {
                warn!(tray_type = %type_name, "queued jobs for unknown tray type, skipping");
                continue;
            }
            if let Err(e) = self.handle_type(type_name, *queued).await {
                error!(tray_type = %type_name, error = %e, "failed to reconcile tray type");
            }
        }
    }

    /// Match one type's queued jobs against its tray pool.
    ///
    /// Counts come fresh from the store while `queued` is the in-memory
    /// snapshot; a small transient disagreement over- or under-provisions
    /// by a little and the next tick corrects it.
    pub async fn handle_type(&self, type_name: &str, queued: usize) -> Result<(), EngineError> {
        let tray_type = self.tray_type(type_name)?;
        let (counts, total) = self.store.count_by_tray_type(type_name).await?;

        let count_of = |status: TrayStatus| counts.get(&status).copied().unwrap_or(0);
        let idle = count_of(TrayStatus::Creating)
            + count_of(TrayStatus::Registering)
            + count_of(TrayStatus::Registered);

        if queued > idle {
            let headroom = tray_type.max_trays.saturating_sub(total);
            let to_create = (queued - idle).min(headroom);
            if to_create > 0 {
                info!(tray_type = type_name, queued, idle, total, to_create, "scaling up");
            }
            for _ in 0..to_create {
                if let Err(e) = self.create_tray(type_name).await {
                    // record stays Creating; the reaper cleans it up
                    error!(tray_type = type_name, error = %e, "failed to create tray");
                }
            }
        } else if queued < idle {
            let to_delete = idle - queued;
            let claimed = self.store.mark_redundant(type_name, to_delete).await?;
            if !claimed.is_empty() {
                info!(
                    tray_type = type_name,
                    queued,
                    idle,
                    claimed = claimed.len(),
                    "scaling down"
                );
            }
            for tray in claimed {
                if let Err(e) = self.delete_tray(&tray.id).await {
                    error!(tray_id = %tray.id, error = %e, "failed to delete redundant tray");
                }
            }
        }

        Ok(())
    }

    /// One reaper pass: delete every tray stuck past its staleness window.
    pub async fn handle_stale(&self) -> Result<(), EngineError> {
        let stale = self.store.get_stale(stale_after(), running_stale_after()).await?;
        for tray in stale {
            info!(
                tray_id = %tray.id,
                status = %tray.status,
                status_changed = %tray.status_changed,
                "reaping stale tray"
            );
            if let Err(e) = self.delete_tray(&tray.id).await {
                error!(tray_id = %tray.id, error = %e, "failed to reap stale tray");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
