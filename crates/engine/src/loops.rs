// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background loops: reconcile tick and stale reaper.

use crate::manager::TrayManager;
use async_trait::async_trait;
use cattery_github::CredentialBroker;
use cattery_store::TrayStore;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::error;

/// How often queued jobs are matched against the tray pool.
const RECONCILE_INTERVAL: Duration = Duration::from_secs(10);

/// How often the stale reaper scans.
const STALE_INTERVAL: Duration = Duration::from_secs(150);

/// Read side of the queue the reconcile loop consumes.
///
/// Implemented by the server over its queue manager; the engine never
/// depends on the queue crate, which keeps the dependency graph acyclic.
#[async_trait]
pub trait QueueCounts: Send + Sync {
    /// Snapshot of `{trayType → queued}`.
    async fn jobs_count(&self) -> HashMap<String, usize>;
}

/// Tick the queue/pool reconciliation until cancelled.
pub async fn run_reconcile_loop<S, B, Q>(
    manager: Arc<TrayManager<S, B>>,
    queue: Arc<Q>,
    cancel: CancellationToken,
) where
    S: TrayStore,
    B: CredentialBroker,
    Q: QueueCounts + ?Sized,
{
    let mut tick = tokio::time::interval(RECONCILE_INTERVAL);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = cancel.cancelled() => return,
            _ = tick.tick() => {}
        }
        let counts = queue.jobs_count().await;
        manager.handle_jobs_queue(&counts).await;
    }
}

/// Tick the stale-tray reaper until cancelled. Errors are logged; the
/// loop never terminates on its own.
pub async fn run_stale_loop<S, B>(manager: Arc<TrayManager<S, B>>, cancel: CancellationToken)
where
    S: TrayStore,
    B: CredentialBroker,
{
    let mut tick = tokio::time::interval(STALE_INTERVAL);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = cancel.cancelled() => return,
            _ = tick.tick() => {}
        }
        if let Err(e) = manager.handle_stale().await {
            error!(error = %e, "stale reaper pass failed");
        }
    }
}
