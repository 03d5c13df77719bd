// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    unknown = { UnregisterReason::Unknown, 0 },
    done = { UnregisterReason::Done, 1 },
    preempted = { UnregisterReason::Preempted, 2 },
)]
fn reason_round_trips_as_integer(reason: UnregisterReason, wire: u8) {
    let json = serde_json::to_string(&reason).unwrap();
    assert_eq!(json, wire.to_string());
    let back: UnregisterReason = serde_json::from_str(&json).unwrap();
    assert_eq!(back, reason);
}

#[test]
fn out_of_range_reason_decodes_as_unknown() {
    let reason: UnregisterReason = serde_json::from_str("9").unwrap();
    assert_eq!(reason, UnregisterReason::Unknown);
}

#[test]
fn register_response_uses_camel_case() {
    let response = RegisterResponse {
        agent: AgentInfo {
            agent_id: "gpu-0123456789abcdef".to_string(),
            runner_id: 42,
            shutdown: true,
        },
        jit_config: "b64blob".to_string(),
    };
    let value = serde_json::to_value(&response).unwrap();
    assert_eq!(value["agent"]["agentId"], "gpu-0123456789abcdef");
    assert_eq!(value["agent"]["runnerId"], 42);
    assert_eq!(value["agent"]["shutdown"], true);
    assert_eq!(value["jitConfig"], "b64blob");
}

#[test]
fn unregister_request_round_trips() {
    let request = UnregisterRequest {
        agent: AgentInfo {
            agent_id: "gpu-0123456789abcdef".to_string(),
            runner_id: 42,
            shutdown: false,
        },
        reason: UnregisterReason::Preempted,
    };
    let json = serde_json::to_string(&request).unwrap();
    let back: UnregisterRequest = serde_json::from_str(&json).unwrap();
    assert_eq!(back, request);
}
