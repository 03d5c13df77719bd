// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Database connection and index bootstrap.

use crate::StoreError;
use bson::doc;
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{Client, Database, IndexModel};
use std::time::Duration;

pub const TRAYS_COLLECTION: &str = "trays";
pub const JOBS_COLLECTION: &str = "jobs";
pub const RESTARTERS_COLLECTION: &str = "restarters";

/// Time allowed for the boot-time ping before startup fails.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Connect to the database and verify it answers before startup proceeds.
pub async fn connect(uri: &str, database: &str) -> Result<Database, StoreError> {
    let mut options = ClientOptions::parse(uri).await?;
    options.connect_timeout = Some(CONNECT_TIMEOUT);
    options.server_selection_timeout = Some(CONNECT_TIMEOUT);

    let client = Client::with_options(options)?;
    let db = client.database(database);

    db.run_command(doc! { "ping": 1 })
        .await
        .map_err(StoreError::Unreachable)?;

    Ok(db)
}

/// Create the indexes the store queries rely on.
///
/// - `trays{id}` unique: primary lookup
/// - `trays{trayTypeName, status}`: mark-redundant and per-type counts
/// - `trays{statusChanged}`: stale scan
/// - `restarters{workflowRunId}` unique: upsert key
///
/// Jobs ride the built-in `_id` index on the source event id.
pub async fn ensure_indexes(db: &Database) -> Result<(), StoreError> {
    let trays = db.collection::<bson::Document>(TRAYS_COLLECTION);
    trays
        .create_index(
            IndexModel::builder()
                .keys(doc! { "id": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build(),
        )
        .await?;
    trays
        .create_index(IndexModel::builder().keys(doc! { "trayTypeName": 1, "status": 1 }).build())
        .await?;
    trays
        .create_index(IndexModel::builder().keys(doc! { "statusChanged": 1 }).build())
        .await?;

    let restarters = db.collection::<bson::Document>(RESTARTERS_COLLECTION);
    restarters
        .create_index(
            IndexModel::builder()
                .keys(doc! { "workflowRunId": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build(),
        )
        .await?;

    Ok(())
}
