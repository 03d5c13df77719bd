// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[test]
fn new_tray_id_has_type_prefix_and_hex_suffix() {
    let id = new_tray_id("gpu");
    let suffix = id.strip_prefix("gpu-").unwrap();
    assert_eq!(suffix.len(), 16);
    assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn new_tray_ids_are_unique() {
    let a = new_tray_id("gpu");
    let b = new_tray_id("gpu");
    assert_ne!(a, b);
}

#[test]
fn new_tray_starts_creating_with_zeroed_assignments() {
    let tray = Tray::new("gpu", "acme", HashMap::new());
    assert_eq!(tray.status, TrayStatus::Creating);
    assert_eq!(tray.git_hub_runner_id, 0);
    assert_eq!(tray.job_run_id, 0);
    assert_eq!(tray.workflow_run_id, 0);
    assert!(tray.id.starts_with("gpu-"));
}

#[parameterized(
    creating = { TrayStatus::Creating, true },
    registering = { TrayStatus::Registering, true },
    registered = { TrayStatus::Registered, true },
    running = { TrayStatus::Running, false },
    deleting = { TrayStatus::Deleting, false },
)]
fn idle_statuses(status: TrayStatus, idle: bool) {
    assert_eq!(status.is_idle(), idle);
}

#[test]
fn status_parse_round_trips_display() {
    for status in TrayStatus::ALL {
        assert_eq!(TrayStatus::parse(&status.to_string()), Some(status));
    }
    assert_eq!(TrayStatus::parse("zombie"), None);
}

#[test]
fn tray_serializes_with_camel_case_fields() {
    let tray = Tray::builder().status(TrayStatus::Registered).git_hub_runner_id(7).build();
    let doc = bson::to_document(&tray).unwrap();
    assert_eq!(doc.get_str("trayTypeName").unwrap(), "gpu");
    assert_eq!(doc.get_str("status").unwrap(), "registered");
    assert_eq!(doc.get_i64("gitHubRunnerId").unwrap(), 7);
    assert!(doc.get_datetime("statusChanged").is_ok());
}
