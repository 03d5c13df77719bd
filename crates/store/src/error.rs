// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Persistence failures. All variants are transient from the caller's
/// point of view; background loops log and retry on the next tick.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("database unreachable at startup: {0}")]
    Unreachable(#[source] mongodb::error::Error),
}
