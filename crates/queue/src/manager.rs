// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Queue manager: persistence and change-feed plumbing around [`JobQueue`].

use crate::JobQueue;
use bson::doc;
use cattery_core::{Job, JobStatus};
use futures_util::{StreamExt, TryStreamExt};
use mongodb::change_stream::event::{ChangeStreamEvent, OperationType};
use mongodb::change_stream::ChangeStream;
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::FullDocumentType;
use mongodb::Collection;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Delay before re-entering `load` after a change-feed failure.
const RELOAD_BACKOFF: std::time::Duration = std::time::Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("no job found with id {0}")]
    NotFound(i64),
}

/// Owns the in-memory queue and its backing collection.
///
/// A read-write gate makes every operation wait while `load` primes the
/// queue, so callers never observe a partially-primed view.
pub struct QueueManager {
    queue: JobQueue,
    collection: Collection<Job>,
    gate: RwLock<()>,
}

impl QueueManager {
    pub fn new(collection: Collection<Job>) -> Self {
        Self { queue: JobQueue::new(), collection, gate: RwLock::new(()) }
    }

    /// Prime the queue and return the change stream to follow.
    ///
    /// The stream is opened before the full scan so mutations racing the
    /// scan are replayed rather than lost; `add` being idempotent makes the
    /// overlap harmless.
    async fn load(&self) -> Result<ChangeStream<ChangeStreamEvent<Job>>, QueueError> {
        let _primed = self.gate.write().await;

        let stream = self
            .collection
            .watch()
            .full_document(FullDocumentType::UpdateLookup)
            .await?;

        let mut cursor = self.collection.find(doc! {}).await?;
        let mut primed = 0;
        while let Some(job) = cursor.try_next().await? {
            if self.queue.add(&job) {
                primed += 1;
            }
        }
        info!(primed, "job queue primed from collection");

        Ok(stream)
    }

    /// Run the load/follow supervisor until cancelled.
    ///
    /// A decode error on the feed re-enters `load`; repeated failures log
    /// and continue, leaving the in-memory view to lag persistence until
    /// the feed heals.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        loop {
            let stream = tokio::select! {
                () = cancel.cancelled() => return,
                result = self.load() => match result {
                    Ok(stream) => stream,
                    Err(error) => {
                        warn!(%error, "failed to load job queue, retrying");
                        tokio::select! {
                            () = cancel.cancelled() => return,
                            () = tokio::time::sleep(RELOAD_BACKOFF) => continue,
                        }
                    }
                },
            };

            self.follow(stream, &cancel).await;
            if cancel.is_cancelled() {
                return;
            }
        }
    }

    /// Apply change-feed events until the stream errors, ends, or `cancel`
    /// fires. Returning hands control back to the supervisor for a reload.
    async fn follow(
        &self,
        mut stream: ChangeStream<ChangeStreamEvent<Job>>,
        cancel: &CancellationToken,
    ) {
        loop {
            let event = tokio::select! {
                () = cancel.cancelled() => return,
                event = stream.next() => event,
            };

            match event {
                Some(Ok(event)) => self.apply(event),
                Some(Err(error)) => {
                    warn!(%error, "failed to decode change stream event, reloading queue");
                    return;
                }
                None => {
                    warn!("job change stream ended, reloading queue");
                    return;
                }
            }
        }
    }

    fn apply(&self, event: ChangeStreamEvent<Job>) {
        match event.operation_type {
            OperationType::Insert | OperationType::Update | OperationType::Replace => {
                if let Some(job) = event.full_document {
                    self.queue.add(&job);
                }
            }
            OperationType::Delete => {
                let id = event.document_key.as_ref().and_then(|key| key.get_i64("_id").ok());
                if let Some(id) = id {
                    self.queue.delete(id);
                }
            }
            other => warn!(operation = ?other, "unknown change stream operation type"),
        }
    }

    /// Insert into the queue and the collection. Idempotent by `job.id`.
    pub async fn add_job(&self, job: &Job) -> Result<(), QueueError> {
        let _gate = self.gate.read().await;

        self.queue.add(job);
        match self.collection.insert_one(job).await {
            Ok(_) => Ok(()),
            // Redelivered webhooks re-insert the same event id; the existing
            // document already reflects it.
            Err(error) if is_duplicate_key(&error) => Ok(()),
            Err(error) => Err(error.into()),
        }
    }

    /// Drop a job that started running on some tray.
    pub async fn job_in_progress(&self, job_id: i64) -> Result<(), QueueError> {
        let _gate = self.gate.read().await;

        if self.queue.get(job_id).is_none() {
            return Err(QueueError::NotFound(job_id));
        }
        self.delete_job(job_id).await
    }

    /// Apply a status observed at the source: started or finished jobs
    /// leave the queue, anything else is a no-op.
    pub async fn update_job_status(
        &self,
        job_id: i64,
        status: JobStatus,
    ) -> Result<(), QueueError> {
        let _gate = self.gate.read().await;

        if self.queue.get(job_id).is_none() {
            return Err(QueueError::NotFound(job_id));
        }
        match status {
            JobStatus::InProgress | JobStatus::Finished => self.delete_job(job_id).await,
            JobStatus::Queued => Ok(()),
        }
    }

    /// Consistent `{trayType → queued}` snapshot.
    pub async fn jobs_count(&self) -> std::collections::HashMap<String, usize> {
        let _gate = self.gate.read().await;
        self.queue.jobs_count()
    }

    async fn delete_job(&self, job_id: i64) -> Result<(), QueueError> {
        self.queue.delete(job_id);
        self.collection.delete_one(doc! { "_id": job_id }).await?;
        Ok(())
    }
}

fn is_duplicate_key(error: &mongodb::error::Error) -> bool {
    matches!(
        &*error.kind,
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == 11000
    )
}
