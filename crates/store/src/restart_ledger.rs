// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persistent set of workflow runs that requested a post-failure restart.

use crate::StoreError;
use async_trait::async_trait;
use bson::doc;
use cattery_core::RestartRequest;
use chrono::Utc;
use mongodb::{Collection, Database};

/// Set-semantics ledger keyed by workflow run id.
#[async_trait]
pub trait RestartLedger: Send + Sync {
    /// Record intent to restart; repeated requests upsert.
    async fn save_restart_request(&self, workflow_run_id: i64) -> Result<(), StoreError>;

    async fn delete_restart_request(&self, workflow_run_id: i64) -> Result<(), StoreError>;

    async fn check_restart_request(&self, workflow_run_id: i64) -> Result<bool, StoreError>;
}

/// Mongo-backed [`RestartLedger`].
#[derive(Clone)]
pub struct MongoRestartLedger {
    collection: Collection<RestartRequest>,
}

impl MongoRestartLedger {
    pub fn new(db: &Database) -> Self {
        Self { collection: db.collection(crate::RESTARTERS_COLLECTION) }
    }
}

#[async_trait]
impl RestartLedger for MongoRestartLedger {
    async fn save_restart_request(&self, workflow_run_id: i64) -> Result<(), StoreError> {
        self.collection
            .update_one(
                doc! { "workflowRunId": workflow_run_id },
                doc! { "$set": {
                    "workflowRunId": workflow_run_id,
                    "createdAt": bson::DateTime::from_chrono(Utc::now()),
                } },
            )
            .upsert(true)
            .await?;
        Ok(())
    }

    async fn delete_restart_request(&self, workflow_run_id: i64) -> Result<(), StoreError> {
        self.collection.delete_one(doc! { "workflowRunId": workflow_run_id }).await?;
        Ok(())
    }

    async fn check_restart_request(&self, workflow_run_id: i64) -> Result<bool, StoreError> {
        let found = self.collection.find_one(doc! { "workflowRunId": workflow_run_id }).await?;
        Ok(found.is_some())
    }
}
