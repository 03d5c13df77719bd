// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! cattery-providers: infrastructure backends that host trays.
//!
//! A provider knows how to spawn and tear down the compute behind one
//! tray. Backends are discovered from config at boot, cached in a
//! [`ProviderRegistry`], and immutable afterwards.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod docker;
mod kubernetes;
mod registry;

use async_trait::async_trait;
use cattery_core::Tray;
use thiserror::Error;

pub use docker::DockerProvider;
pub use kubernetes::KubernetesProvider;
pub use registry::ProviderRegistry;

#[derive(Debug, Error)]
pub enum ProviderError {
    /// The backing compute no longer exists. Teardown treats this as
    /// success so deletion stays idempotent.
    #[error("tray not found at provider")]
    NotFound,

    #[error("unknown provider type '{0}'")]
    UnknownType(String),

    #[error("failed to construct provider '{name}': {reason}")]
    Construct { name: String, reason: String },

    #[error("failed to run tray: {0}")]
    Run(String),

    #[error("failed to clean tray: {0}")]
    Clean(String),
}

/// Capability interface over one configured backend instance.
#[async_trait]
pub trait TrayProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Spawn the compute for a tray. The tray's `provider_data` carries the
    /// type's provider config merged with its extra metadata.
    async fn run_tray(&self, tray: &Tray) -> Result<(), ProviderError>;

    /// Tear the compute down. Must be idempotent: a tray that is already
    /// gone returns [`ProviderError::NotFound`], which callers map to
    /// success.
    async fn clean_tray(&self, tray: &Tray) -> Result<(), ProviderError>;
}
