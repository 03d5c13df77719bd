// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Unit tests for the tray state machine and reconciliation math.

use super::*;
use crate::test_support::{MockBroker, MockProvider};
use cattery_core::FakeClock;
use cattery_store::memory::InMemoryTrayStore;
use cattery_store::TrayStore as _;
use std::collections::HashMap as Map;

struct Harness {
    manager: TrayManager<InMemoryTrayStore<FakeClock>, MockBroker>,
    store: InMemoryTrayStore<FakeClock>,
    provider: MockProvider,
    broker: MockBroker,
    clock: FakeClock,
}

fn tray_type(name: &str, max_trays: usize) -> cattery_config::TrayType {
    cattery_config::TrayType {
        name: name.to_string(),
        provider: "docker".to_string(),
        runner_group_id: 7,
        shutdown: false,
        github_org: "acme".to_string(),
        max_trays,
        config: Map::new(),
        extra_metadata: Map::new(),
    }
}

fn harness(max_trays: usize) -> Harness {
    let clock = FakeClock::new();
    let store = InMemoryTrayStore::with_clock(clock.clone());
    let provider = MockProvider::new("docker");
    let broker = MockBroker::new();
    let registry = Arc::new(ProviderRegistry::from_providers([(
        "docker".to_string(),
        Arc::new(provider.clone()) as Arc<dyn TrayProvider>,
    )]));
    let manager =
        TrayManager::new(store.clone(), broker.clone(), registry, [tray_type("gpu", max_trays)]);
    Harness { manager, store, provider, broker, clock }
}

#[tokio::test]
async fn create_tray_persists_then_provisions() {
    let h = harness(3);
    let tray = h.manager.create_tray("gpu").await.unwrap();

    assert_eq!(tray.status, TrayStatus::Creating);
    assert!(h.store.get_by_id(&tray.id).await.unwrap().is_some());
    assert_eq!(h.provider.runs(), vec![tray.id]);
}

#[tokio::test]
async fn create_tray_rejects_unknown_type() {
    let h = harness(3);
    let err = h.manager.create_tray("tpu").await.unwrap_err();
    assert!(matches!(err, EngineError::UnknownTrayType(name) if name == "tpu"));
}

#[tokio::test]
async fn failed_provisioning_leaves_record_for_the_reaper() {
    let h = harness(3);
    h.provider.fail_runs();

    assert!(h.manager.create_tray("gpu").await.is_err());

    // the record survives in Creating; handle_stale reaps it later
    let trays = h.store.all();
    assert_eq!(trays.len(), 1);
    assert_eq!(trays[0].status, TrayStatus::Creating);
}

#[tokio::test]
async fn register_agent_walks_the_handshake() {
    let h = harness(3);
    let tray = h.manager.create_tray("gpu").await.unwrap();

    let issued = h.manager.register_agent(&tray.id).await.unwrap().unwrap();
    assert_eq!(issued.tray.status, TrayStatus::Registered);
    assert_ne!(issued.tray.git_hub_runner_id, 0);
    assert_eq!(issued.jit.runner_id, issued.tray.git_hub_runner_id);
    assert_eq!(issued.jit.encoded_jit_config, format!("jit-{}", tray.id));
    assert!(!issued.shutdown);
    assert_eq!(h.broker.issues(), vec![tray.id]);
}

#[tokio::test]
async fn register_agent_for_reaped_tray_returns_none() {
    let h = harness(3);
    let issued = h.manager.register_agent("gpu-feedfacefeedface").await.unwrap();
    assert!(issued.is_none());
    assert!(h.broker.issues().is_empty());
}

#[tokio::test]
async fn set_job_marks_the_tray_running() {
    let h = harness(3);
    let tray = h.manager.create_tray("gpu").await.unwrap();
    h.manager.register_agent(&tray.id).await.unwrap();

    let updated = h.manager.set_job(&tray.id, 100, 9).await.unwrap().unwrap();
    assert_eq!(updated.status, TrayStatus::Running);
    assert_eq!(updated.job_run_id, 100);
    assert_eq!(updated.workflow_run_id, 9);
}

#[tokio::test]
async fn set_job_after_terminal_transition_is_dropped() {
    let h = harness(3);
    let tray = h.manager.create_tray("gpu").await.unwrap();
    h.manager.delete_tray(&tray.id).await.unwrap();

    // "in_progress" reordered after "completed": the late event observes
    // a missing tray and is dropped
    let updated = h.manager.set_job(&tray.id, 100, 9).await.unwrap();
    assert!(updated.is_none());
}

#[tokio::test]
async fn delete_tray_revokes_cleans_and_drops() {
    let h = harness(3);
    let tray = h.manager.create_tray("gpu").await.unwrap();
    let issued = h.manager.register_agent(&tray.id).await.unwrap().unwrap();

    h.manager.delete_tray(&tray.id).await.unwrap();

    assert!(h.store.get_by_id(&tray.id).await.unwrap().is_none());
    assert_eq!(h.provider.cleans(), vec![tray.id.clone()]);
    assert_eq!(h.broker.revokes(), vec![(tray.id, issued.jit.runner_id)]);
}

#[tokio::test]
async fn delete_tray_is_idempotent() {
    let h = harness(3);
    let tray = h.manager.create_tray("gpu").await.unwrap();

    h.manager.delete_tray(&tray.id).await.unwrap();
    h.manager.delete_tray(&tray.id).await.unwrap();

    // the second delete observed a missing tray and skipped the provider
    assert_eq!(h.provider.cleans().len(), 1);
}

#[tokio::test]
async fn delete_tray_treats_missing_compute_as_success() {
    let h = harness(3);
    let tray = h.manager.create_tray("gpu").await.unwrap();
    h.provider.clean_not_found();

    h.manager.delete_tray(&tray.id).await.unwrap();
    assert!(h.store.get_by_id(&tray.id).await.unwrap().is_none());
}

#[tokio::test]
async fn unregistered_trays_are_deleted_without_revocation() {
    let h = harness(3);
    let tray = h.manager.create_tray("gpu").await.unwrap();

    h.manager.delete_tray(&tray.id).await.unwrap();
    assert!(h.broker.revokes().is_empty());
}

#[tokio::test]
async fn scale_up_is_capped_by_max_trays() {
    let h = harness(3);

    // 5 queued, nothing provisioned, cap 3
    h.manager.handle_type("gpu", 5).await.unwrap();
    assert_eq!(h.provider.runs().len(), 3);
    assert_eq!(h.store.len(), 3);

    // still 5 queued, idle already 3: no headroom, no new trays
    h.manager.handle_type("gpu", 5).await.unwrap();
    assert_eq!(h.provider.runs().len(), 3);
}

#[tokio::test]
async fn scale_up_tops_up_to_queued() {
    let h = harness(10);
    h.manager.handle_type("gpu", 2).await.unwrap();
    assert_eq!(h.store.len(), 2);

    h.manager.handle_type("gpu", 6).await.unwrap();
    assert_eq!(h.store.len(), 6);
}

#[tokio::test]
async fn matching_queue_and_pool_is_a_no_op() {
    let h = harness(10);
    h.manager.handle_type("gpu", 2).await.unwrap();

    h.manager.handle_type("gpu", 2).await.unwrap();
    assert_eq!(h.store.len(), 2);
    assert!(h.provider.cleans().is_empty());
}

#[tokio::test]
async fn scale_down_deletes_redundant_trays() {
    let h = harness(4);
    h.manager.handle_type("gpu", 4).await.unwrap();
    assert_eq!(h.store.len(), 4);

    // queue drained: all four idle trays are claimed and deleted
    h.manager.handle_type("gpu", 0).await.unwrap();
    assert_eq!(h.store.len(), 0);
    assert_eq!(h.provider.cleans().len(), 4);
}

#[tokio::test]
async fn scale_down_never_touches_running_trays() {
    let h = harness(4);
    let tray = h.manager.create_tray("gpu").await.unwrap();
    h.manager.register_agent(&tray.id).await.unwrap();
    h.manager.set_job(&tray.id, 100, 9).await.unwrap();

    h.manager.handle_type("gpu", 0).await.unwrap();
    let survivor = h.store.get_by_id(&tray.id).await.unwrap().unwrap();
    assert_eq!(survivor.status, TrayStatus::Running);
}

#[tokio::test]
async fn unknown_types_in_the_snapshot_are_skipped() {
    let h = harness(3);
    let counts = Map::from([("tpu".to_string(), 5), ("gpu".to_string(), 1)]);

    h.manager.handle_jobs_queue(&counts).await;

    // only the configured type was reconciled
    assert_eq!(h.store.len(), 1);
    assert!(h.store.all()[0].id.starts_with("gpu-"));
}

#[tokio::test]
async fn handle_stale_reaps_stuck_trays() {
    let h = harness(3);
    let stuck = h.manager.create_tray("gpu").await.unwrap();
    h.manager.registering(&stuck.id).await.unwrap();

    h.clock.advance(chrono::Duration::minutes(6));
    let fresh = h.manager.create_tray("gpu").await.unwrap();

    h.manager.handle_stale().await.unwrap();

    assert!(h.store.get_by_id(&stuck.id).await.unwrap().is_none());
    assert!(h.store.get_by_id(&fresh.id).await.unwrap().is_some());
}

#[tokio::test]
async fn handle_stale_survives_provider_not_found() {
    let h = harness(3);
    let tray = h.manager.create_tray("gpu").await.unwrap();
    h.provider.clean_not_found();

    h.clock.advance(chrono::Duration::minutes(6));
    h.manager.handle_stale().await.unwrap();

    assert!(h.store.get_by_id(&tray.id).await.unwrap().is_none());
}
