// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persistent tray map keyed by tray id.

use crate::StoreError;
use async_trait::async_trait;
use bson::doc;
use cattery_core::{Tray, TrayStatus};
use chrono::{Duration, Utc};
use futures_util::TryStreamExt;
use mongodb::options::ReturnDocument;
use mongodb::{Collection, Database};
use std::collections::HashMap;

/// Per-status tray counts for one tray type, pre-populated with zeros.
pub type StatusCounts = HashMap<TrayStatus, usize>;

/// Order in which redundant capacity is reclaimed. Cheapest first;
/// `Running` trays are never claimed.
const REDUNDANT_ORDER: [TrayStatus; 3] =
    [TrayStatus::Creating, TrayStatus::Registering, TrayStatus::Registered];

/// Typed operations over the tray collection.
///
/// `update_status` is the single mutation funnel: a conditional update
/// returning the post-image, where `None` means the tray vanished and the
/// transition is dropped.
#[async_trait]
pub trait TrayStore: Send + Sync {
    async fn get_by_id(&self, tray_id: &str) -> Result<Option<Tray>, StoreError>;

    /// Insert a new tray, stamping `status_changed`.
    async fn save(&self, tray: &Tray) -> Result<(), StoreError>;

    /// Conditionally transition a tray, returning the post-image.
    ///
    /// Zero-valued `job_run_id` / `workflow_run_id` / `runner_id` are not
    /// written, so later transitions preserve earlier assignments.
    async fn update_status(
        &self,
        tray_id: &str,
        status: TrayStatus,
        job_run_id: i64,
        workflow_run_id: i64,
        runner_id: i64,
    ) -> Result<Option<Tray>, StoreError>;

    async fn delete(&self, tray_id: &str) -> Result<(), StoreError>;

    /// Aggregate `{status → count}` and the total for one tray type.
    async fn count_by_tray_type(
        &self,
        tray_type: &str,
    ) -> Result<(StatusCounts, usize), StoreError>;

    /// Atomically claim up to `limit` idle trays of `tray_type` by flipping
    /// them to `Deleting`, preferring the cheapest states to reclaim.
    async fn mark_redundant(
        &self,
        tray_type: &str,
        limit: usize,
    ) -> Result<Vec<Tray>, StoreError>;

    /// Trays whose last transition is older than `threshold` (non-Running)
    /// or `running_threshold` (Running, as an orphaned-execution net).
    async fn get_stale(
        &self,
        threshold: Duration,
        running_threshold: Duration,
    ) -> Result<Vec<Tray>, StoreError>;
}

/// Mongo-backed [`TrayStore`].
#[derive(Clone)]
pub struct MongoTrayStore {
    collection: Collection<Tray>,
}

impl MongoTrayStore {
    pub fn new(db: &Database) -> Self {
        Self { collection: db.collection(crate::TRAYS_COLLECTION) }
    }
}

#[async_trait]
impl TrayStore for MongoTrayStore {
    async fn get_by_id(&self, tray_id: &str) -> Result<Option<Tray>, StoreError> {
        Ok(self.collection.find_one(doc! { "id": tray_id }).await?)
    }

    async fn save(&self, tray: &Tray) -> Result<(), StoreError> {
        let mut tray = tray.clone();
        tray.status_changed = Utc::now();
        self.collection.insert_one(&tray).await?;
        Ok(())
    }

    async fn update_status(
        &self,
        tray_id: &str,
        status: TrayStatus,
        job_run_id: i64,
        workflow_run_id: i64,
        runner_id: i64,
    ) -> Result<Option<Tray>, StoreError> {
        let mut set = doc! {
            "status": status.to_string(),
            "statusChanged": bson::DateTime::from_chrono(Utc::now()),
        };
        if job_run_id != 0 {
            set.insert("jobRunId", job_run_id);
        }
        if workflow_run_id != 0 {
            set.insert("workflowRunId", workflow_run_id);
        }
        if runner_id != 0 {
            set.insert("gitHubRunnerId", runner_id);
        }

        let updated = self
            .collection
            .find_one_and_update(doc! { "id": tray_id }, doc! { "$set": set })
            .return_document(ReturnDocument::After)
            .await?;
        Ok(updated)
    }

    async fn delete(&self, tray_id: &str) -> Result<(), StoreError> {
        self.collection.delete_one(doc! { "id": tray_id }).await?;
        Ok(())
    }

    async fn count_by_tray_type(
        &self,
        tray_type: &str,
    ) -> Result<(StatusCounts, usize), StoreError> {
        let pipeline = vec![
            doc! { "$match": { "trayTypeName": tray_type } },
            doc! { "$group": { "_id": "$status", "count": { "$sum": 1 } } },
        ];
        let mut cursor = self.collection.aggregate(pipeline).await?;

        let mut counts: StatusCounts = TrayStatus::ALL.iter().map(|s| (*s, 0)).collect();
        let mut total = 0;
        while let Some(row) = cursor.try_next().await? {
            let Some(status) = row.get_str("_id").ok().and_then(TrayStatus::parse) else {
                tracing::warn!(tray_type, row = ?row, "skipping count row with unknown status");
                continue;
            };
            let count = match row.get("count") {
                Some(bson::Bson::Int32(n)) => *n as usize,
                Some(bson::Bson::Int64(n)) => *n as usize,
                _ => 0,
            };
            counts.insert(status, count);
            total += count;
        }
        Ok((counts, total))
    }

    async fn mark_redundant(
        &self,
        tray_type: &str,
        limit: usize,
    ) -> Result<Vec<Tray>, StoreError> {
        let mut claimed = Vec::new();

        for status in REDUNDANT_ORDER {
            while claimed.len() < limit {
                let updated = self
                    .collection
                    .find_one_and_update(
                        doc! { "trayTypeName": tray_type, "status": status.to_string() },
                        doc! { "$set": {
                            "status": TrayStatus::Deleting.to_string(),
                            "statusChanged": bson::DateTime::from_chrono(Utc::now()),
                            "jobRunId": 0,
                        } },
                    )
                    .return_document(ReturnDocument::After)
                    .await?;
                match updated {
                    Some(tray) => claimed.push(tray),
                    None => break,
                }
            }
        }

        Ok(claimed)
    }

    async fn get_stale(
        &self,
        threshold: Duration,
        running_threshold: Duration,
    ) -> Result<Vec<Tray>, StoreError> {
        let now = Utc::now();
        let idle_cutoff = bson::DateTime::from_chrono(now - threshold);
        let running_cutoff = bson::DateTime::from_chrono(now - running_threshold);

        let running = TrayStatus::Running.to_string();
        let cursor = self
            .collection
            .find(doc! { "$or": [
                { "status": { "$ne": running.as_str() }, "statusChanged": { "$lte": idle_cutoff } },
                { "status": running.as_str(), "statusChanged": { "$lte": running_cutoff } },
            ] })
            .await?;

        Ok(cursor.try_collect().await?)
    }
}
