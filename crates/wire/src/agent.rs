// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent-facing protocol messages.

use serde::{Deserialize, Serialize};

/// Why an agent is unregistering. Crosses the wire as an integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnregisterReason {
    Unknown,
    Done,
    Preempted,
}

impl UnregisterReason {
    pub fn as_u8(self) -> u8 {
        match self {
            UnregisterReason::Unknown => 0,
            UnregisterReason::Done => 1,
            UnregisterReason::Preempted => 2,
        }
    }

    pub fn from_u8(value: u8) -> UnregisterReason {
        match value {
            1 => UnregisterReason::Done,
            2 => UnregisterReason::Preempted,
            _ => UnregisterReason::Unknown,
        }
    }
}

cattery_core::simple_display! {
    UnregisterReason {
        Unknown => "unknown",
        Done => "done",
        Preempted => "preempted",
    }
}

impl Serialize for UnregisterReason {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_u8())
    }
}

impl<'de> Deserialize<'de> for UnregisterReason {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(UnregisterReason::from_u8(u8::deserialize(deserializer)?))
    }
}

/// Identity the server hands an agent at registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentInfo {
    pub agent_id: String,
    pub runner_id: i64,
    /// True when the agent should power the host down after its job.
    pub shutdown: bool,
}

/// Response body for `GET /agent/register/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub agent: AgentInfo,
    /// Opaque one-shot blob the agent hands to the runner binary.
    pub jit_config: String,
}

/// Request body for `POST /agent/unregister/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnregisterRequest {
    pub agent: AgentInfo,
    pub reason: UnregisterReason,
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
