// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tray entity and its lifecycle status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Alphabet for the random tray id suffix.
const HEX: [char; 16] =
    ['0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f'];

/// Lifecycle status of a tray.
///
/// Transitions only ever advance:
/// `Creating → Registering → Registered → Running → Deleting`, with
/// `Deleting` reachable from any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrayStatus {
    Creating,
    Registering,
    Registered,
    Running,
    Deleting,
}

impl TrayStatus {
    /// Every status, in lifecycle order. Used to pre-populate count maps.
    pub const ALL: [TrayStatus; 5] = [
        TrayStatus::Creating,
        TrayStatus::Registering,
        TrayStatus::Registered,
        TrayStatus::Running,
        TrayStatus::Deleting,
    ];

    /// Statuses counted as idle capacity by the reconcile loop.
    pub fn is_idle(self) -> bool {
        matches!(self, TrayStatus::Creating | TrayStatus::Registering | TrayStatus::Registered)
    }

    /// Parse the persisted lowercase form back into a status.
    pub fn parse(s: &str) -> Option<TrayStatus> {
        match s {
            "creating" => Some(TrayStatus::Creating),
            "registering" => Some(TrayStatus::Registering),
            "registered" => Some(TrayStatus::Registered),
            "running" => Some(TrayStatus::Running),
            "deleting" => Some(TrayStatus::Deleting),
            _ => None,
        }
    }
}

crate::simple_display! {
    TrayStatus {
        Creating => "creating",
        Registering => "registering",
        Registered => "registered",
        Running => "running",
        Deleting => "deleting",
    }
}

/// A provisioned (or about-to-be) single-use runner host.
///
/// The document form of this struct is the source of truth for the tray
/// state machine; every mutation goes through a conditional update that
/// stamps `status_changed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tray {
    /// Globally unique id, `"<trayTypeName>-<hex16>"`. Never changes.
    pub id: String,
    pub tray_type_name: String,
    pub git_hub_org_name: String,
    /// Runner id assigned when credentials are issued; 0 until then.
    #[serde(default)]
    pub git_hub_runner_id: i64,
    /// Job run executing on this tray; 0 unless `Running`.
    #[serde(default)]
    pub job_run_id: i64,
    /// Workflow run enclosing `job_run_id`; 0 unless `Running`.
    #[serde(default)]
    pub workflow_run_id: i64,
    pub status: TrayStatus,
    /// Updated on every transition; monotonically non-decreasing per tray.
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub status_changed: DateTime<Utc>,
    /// Opaque per-provider scratch (image, name prefix, extra metadata).
    #[serde(default)]
    pub provider_data: HashMap<String, String>,
}

impl Tray {
    /// Create a tray in `Creating` with a fresh random id.
    ///
    /// `provider_data` carries the tray type's provider config merged with
    /// its extra metadata, so providers never need the type table.
    pub fn new(
        tray_type_name: impl Into<String>,
        git_hub_org_name: impl Into<String>,
        provider_data: HashMap<String, String>,
    ) -> Self {
        let tray_type_name = tray_type_name.into();
        Self {
            id: new_tray_id(&tray_type_name),
            tray_type_name,
            git_hub_org_name: git_hub_org_name.into(),
            git_hub_runner_id: 0,
            job_run_id: 0,
            workflow_run_id: 0,
            status: TrayStatus::Creating,
            status_changed: Utc::now(),
            provider_data,
        }
    }
}

/// Generate a tray id: the type name plus a 16-char hex suffix.
pub fn new_tray_id(tray_type_name: &str) -> String {
    format!("{}-{}", tray_type_name, nanoid::nanoid!(16, &HEX))
}

crate::builder! {
    pub struct TrayBuilder => Tray {
        into {
            id: String = "gpu-0123456789abcdef",
            tray_type_name: String = "gpu",
            git_hub_org_name: String = "acme",
        }
        set {
            git_hub_runner_id: i64 = 0,
            job_run_id: i64 = 0,
            workflow_run_id: i64 = 0,
            status: TrayStatus = TrayStatus::Creating,
            provider_data: HashMap<String, String> = HashMap::new(),
        }
        computed {
            status_changed: DateTime<Utc> = Utc::now(),
        }
    }
}

#[cfg(test)]
#[path = "tray_tests.rs"]
mod tests;
