// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! cattery-config: boot-time YAML configuration.
//!
//! Loaded once at startup and read-only afterwards. Validation is strict:
//! missing required fields or dangling provider/org references abort boot.

mod app;

pub use app::{
    AppConfig, ConfigError, DatabaseConfig, GithubOrgConfig, ProviderConfig, ServerConfig,
    TrayType, DEFAULT_CONFIG_PATH,
};
