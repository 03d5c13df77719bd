// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! cattery-store: crash-safe persistence for trays and restart requests.
//!
//! The document database is the source of truth for tray state; every
//! transition is a conditional update returning the post-image so stale
//! writers observe `None` instead of clobbering newer state.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod db;
mod error;
mod restart_ledger;
mod tray_store;

#[cfg(any(test, feature = "test-support"))]
pub mod memory;

pub use db::{connect, ensure_indexes, JOBS_COLLECTION, RESTARTERS_COLLECTION, TRAYS_COLLECTION};
pub use error::StoreError;
pub use restart_ledger::{MongoRestartLedger, RestartLedger};
pub use tray_store::{MongoTrayStore, StatusCounts, TrayStore};
