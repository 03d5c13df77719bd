// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! cattery-queue: in-memory replica of the pending-job collection.
//!
//! The queue is a two-index view (by job id, by tray type) primed from the
//! jobs collection and kept in sync through its change feed. The replica is
//! advisory: the reconcile loop re-reads tray counts from the database and
//! tolerates a lagging queue snapshot.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod job_queue;
mod manager;

pub use job_queue::JobQueue;
pub use manager::{QueueError, QueueManager};
