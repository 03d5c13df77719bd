// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] cattery_store::StoreError),

    #[error(transparent)]
    Github(#[from] cattery_github::GithubError),

    #[error(transparent)]
    Provider(#[from] cattery_providers::ProviderError),

    #[error("unknown tray type '{0}'")]
    UnknownTrayType(String),

    #[error("no provider '{provider}' for tray type '{tray_type}'")]
    UnknownProvider { tray_type: String, provider: String },
}
