// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persisted intent to rerun failed jobs of a workflow run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Set-semantics record keyed by workflow run id; repeated requests upsert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestartRequest {
    pub workflow_run_id: i64,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}
