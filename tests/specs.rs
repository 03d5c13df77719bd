// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end scheduler scenarios against in-memory infrastructure.
//!
//! Each test walks one full webhook-to-teardown story through the real
//! engine, with the store, provider, and credential broker replaced by
//! recording doubles.

use cattery_core::{FakeClock, TrayStatus};
use cattery_engine::test_support::{MockActions, MockBroker, MockProvider};
use cattery_engine::{TrayManager, WorkflowRestarter};
use cattery_providers::{ProviderRegistry, TrayProvider};
use cattery_store::memory::{InMemoryRestartLedger, InMemoryTrayStore};
use cattery_store::TrayStore as _;
use std::collections::HashMap;
use std::sync::Arc;

struct ControlPlane {
    manager: TrayManager<InMemoryTrayStore<FakeClock>, MockBroker>,
    store: InMemoryTrayStore<FakeClock>,
    provider: MockProvider,
    broker: MockBroker,
    clock: FakeClock,
}

fn control_plane(max_trays: usize) -> ControlPlane {
    let clock = FakeClock::new();
    let store = InMemoryTrayStore::with_clock(clock.clone());
    let provider = MockProvider::new("docker");
    let broker = MockBroker::new();
    let registry = Arc::new(ProviderRegistry::from_providers([(
        "docker".to_string(),
        Arc::new(provider.clone()) as Arc<dyn TrayProvider>,
    )]));

    let gpu = cattery_config::TrayType {
        name: "gpu".to_string(),
        provider: "docker".to_string(),
        runner_group_id: 7,
        shutdown: false,
        github_org: "acme".to_string(),
        max_trays,
        config: HashMap::new(),
        extra_metadata: HashMap::new(),
    };

    let manager = TrayManager::new(store.clone(), broker.clone(), registry, [gpu]);
    ControlPlane { manager, store, provider, broker, clock }
}

fn queued(n: usize) -> HashMap<String, usize> {
    HashMap::from([("gpu".to_string(), n)])
}

async fn statuses(store: &InMemoryTrayStore<FakeClock>) -> HashMap<TrayStatus, usize> {
    let (counts, _) = store.count_by_tray_type("gpu").await.unwrap();
    counts
}

#[tokio::test]
async fn cold_scale_up_respects_the_type_cap() {
    let cp = control_plane(3);

    // five jobs queue up against an empty pool; only three trays fit
    cp.manager.handle_jobs_queue(&queued(5)).await;
    assert_eq!(cp.store.len(), 3);
    assert_eq!(cp.provider.runs().len(), 3);

    // all three agents register
    for tray in cp.store.all() {
        cp.manager.register_agent(&tray.id).await.unwrap().unwrap();
    }
    assert_eq!(statuses(&cp.store).await[&TrayStatus::Registered], 3);

    // still five queued, idle already three, no headroom: nothing new
    cp.manager.handle_jobs_queue(&queued(5)).await;
    assert_eq!(cp.store.len(), 3);
    assert_eq!(cp.provider.runs().len(), 3);
}

#[tokio::test]
async fn completion_path_tears_the_tray_down_exactly_once() {
    let cp = control_plane(3);
    let tray = cp.manager.create_tray("gpu").await.unwrap();
    let issued = cp.manager.register_agent(&tray.id).await.unwrap().unwrap();

    // webhook "in_progress": job 100 of workflow run 9 landed on this tray
    let running = cp.manager.set_job(&tray.id, 100, 9).await.unwrap().unwrap();
    assert_eq!(running.status, TrayStatus::Running);
    assert_eq!(running.job_run_id, 100);
    assert_eq!(running.workflow_run_id, 9);

    // webhook "completed": tray reaches ⊥ with one revoke and one clean
    cp.manager.delete_tray(&tray.id).await.unwrap();
    assert!(cp.store.get_by_id(&tray.id).await.unwrap().is_none());
    assert_eq!(cp.broker.revokes(), vec![(tray.id.clone(), issued.jit.runner_id)]);
    assert_eq!(cp.provider.cleans(), vec![tray.id.clone()]);

    // webhook redelivery cannot produce a second clean
    cp.manager.delete_tray(&tray.id).await.unwrap();
    assert_eq!(cp.provider.cleans().len(), 1);
}

#[tokio::test]
async fn reordered_in_progress_loses_to_the_terminal_transition() {
    let cp = control_plane(3);
    let tray = cp.manager.create_tray("gpu").await.unwrap();
    cp.manager.register_agent(&tray.id).await.unwrap().unwrap();

    // "completed" arrives first and wins
    cp.manager.delete_tray(&tray.id).await.unwrap();

    // the late "in_progress" observes a missing tray and is dropped
    let dropped = cp.manager.set_job(&tray.id, 100, 9).await.unwrap();
    assert!(dropped.is_none());
    assert!(cp.store.get_by_id(&tray.id).await.unwrap().is_none());
}

#[tokio::test]
async fn stale_reaper_cleans_a_stuck_registration() {
    let cp = control_plane(3);
    let tray = cp.manager.create_tray("gpu").await.unwrap();
    cp.manager.registering(&tray.id).await.unwrap().unwrap();

    // the tray sits in Registering past the staleness window; the
    // provider already lost the compute
    cp.clock.advance(chrono::Duration::minutes(6));
    cp.provider.clean_not_found();

    cp.manager.handle_stale().await.unwrap();
    assert!(cp.store.get_by_id(&tray.id).await.unwrap().is_none());
    assert_eq!(cp.provider.cleans(), vec![tray.id]);
}

#[tokio::test]
async fn running_trays_outlive_the_short_staleness_window() {
    let cp = control_plane(3);
    let tray = cp.manager.create_tray("gpu").await.unwrap();
    cp.manager.register_agent(&tray.id).await.unwrap().unwrap();
    cp.manager.set_job(&tray.id, 100, 9).await.unwrap().unwrap();

    // six minutes: past the idle threshold, inside the running net
    cp.clock.advance(chrono::Duration::minutes(6));
    cp.manager.handle_stale().await.unwrap();
    assert!(cp.store.get_by_id(&tray.id).await.unwrap().is_some());

    // eleven minutes: the safety net reaps orphaned execution too
    cp.clock.advance(chrono::Duration::minutes(5));
    cp.manager.handle_stale().await.unwrap();
    assert!(cp.store.get_by_id(&tray.id).await.unwrap().is_none());
}

#[tokio::test]
async fn empty_queue_scales_registered_trays_down() {
    let cp = control_plane(4);
    cp.manager.handle_jobs_queue(&queued(4)).await;
    for tray in cp.store.all() {
        cp.manager.register_agent(&tray.id).await.unwrap().unwrap();
    }
    assert_eq!(statuses(&cp.store).await[&TrayStatus::Registered], 4);

    // the queue drained: all four idle trays are claimed atomically and
    // torn down
    cp.manager.handle_jobs_queue(&queued(0)).await;
    assert!(cp.store.is_empty());
    assert_eq!(cp.provider.cleans().len(), 4);
    assert_eq!(cp.broker.revokes().len(), 4);
}

#[tokio::test]
async fn partial_scale_down_keeps_enough_idle_trays() {
    let cp = control_plane(4);
    cp.manager.handle_jobs_queue(&queued(4)).await;

    cp.manager.handle_jobs_queue(&queued(1)).await;
    assert_eq!(cp.store.len(), 1);
}

#[tokio::test]
async fn restart_on_failure_consumes_the_request() {
    let ledger = InMemoryRestartLedger::new();
    let actions = MockActions::new();
    let restarter = WorkflowRestarter::new(ledger.clone(), actions.clone());

    restarter.request_restart(42).await.unwrap();

    // workflow_run completed with conclusion=failure
    let restarted = restarter.restart(42, "acme", "widgets").await.unwrap();
    assert!(restarted);
    assert_eq!(actions.reruns(), vec![("acme".to_string(), "widgets".to_string(), 42)]);
    assert!(ledger.is_empty());

    // the next failure of the same run has no request left to consume
    let restarted = restarter.restart(42, "acme", "widgets").await.unwrap();
    assert!(!restarted);
    assert_eq!(actions.reruns().len(), 1);
}

#[tokio::test]
async fn successful_conclusion_retires_the_request_silently() {
    let ledger = InMemoryRestartLedger::new();
    let actions = MockActions::new();
    let restarter = WorkflowRestarter::new(ledger.clone(), actions.clone());

    restarter.request_restart(42).await.unwrap();

    // workflow_run completed with conclusion=success
    restarter.cleanup(42).await.unwrap();
    assert!(ledger.is_empty());
    assert!(actions.reruns().is_empty());
}

#[tokio::test]
async fn status_changed_never_goes_backwards() {
    let cp = control_plane(3);
    let tray = cp.manager.create_tray("gpu").await.unwrap();

    let mut last = cp.store.get_by_id(&tray.id).await.unwrap().unwrap().status_changed;
    for minutes in [1, 2, 3] {
        cp.clock.advance(chrono::Duration::minutes(minutes));
        let observed = match minutes {
            1 => cp.manager.registering(&tray.id).await.unwrap().unwrap(),
            2 => cp.manager.registered(&tray.id, 7).await.unwrap().unwrap(),
            _ => cp.manager.set_job(&tray.id, 100, 9).await.unwrap().unwrap(),
        };
        assert!(observed.status_changed > last);
        last = observed.status_changed;
    }
}
