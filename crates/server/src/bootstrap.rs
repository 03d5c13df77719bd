// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Startup and shutdown of the control plane.

use crate::state::{AppState, QueueCountsAdapter};
use crate::ServerError;
use cattery_config::AppConfig;
use cattery_engine::{run_reconcile_loop, run_stale_loop, TrayManager, WorkflowRestarter};
use cattery_github::GithubOrgs;
use cattery_providers::ProviderRegistry;
use cattery_queue::QueueManager;
use cattery_store::{MongoRestartLedger, MongoTrayStore, JOBS_COLLECTION};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Boot the control plane and serve until SIGINT/SIGTERM.
///
/// Fails fast on anything unrecoverable: unreachable database, unreadable
/// private key, unbuildable provider.
pub async fn run(config: AppConfig) -> Result<(), ServerError> {
    let db = cattery_store::connect(&config.database.uri, &config.database.database).await?;
    cattery_store::ensure_indexes(&db).await?;

    let orgs = Arc::new(GithubOrgs::from_config(&config.github)?);
    let registry = Arc::new(
        ProviderRegistry::from_config(&config.providers, &config.server.advertise_url).await?,
    );

    let manager = Arc::new(TrayManager::new(
        MongoTrayStore::new(&db),
        orgs.clone(),
        registry,
        config.tray_types.clone(),
    ));
    let restarter = Arc::new(WorkflowRestarter::new(MongoRestartLedger::new(&db), orgs));
    let queue = Arc::new(QueueManager::new(db.collection(JOBS_COLLECTION)));

    // Background workers: change-feed consumer, reconcile tick, stale
    // reaper. All exit when the root token cancels.
    let cancel = CancellationToken::new();
    tokio::spawn(queue.clone().run(cancel.child_token()));
    tokio::spawn(run_reconcile_loop(
        manager.clone(),
        Arc::new(QueueCountsAdapter(queue.clone())),
        cancel.child_token(),
    ));
    tokio::spawn(run_stale_loop(manager.clone(), cancel.child_token()));

    let state = AppState::new(config.clone(), manager, restarter, queue);
    let listener = TcpListener::bind(&config.server.listen_address).await.map_err(|source| {
        ServerError::Bind { address: config.server.listen_address.clone(), source }
    })?;

    info!(listen_address = %config.server.listen_address, "cattery server listening");
    axum::serve(listener, crate::router(state))
        .with_graceful_shutdown(shutdown_signal(cancel))
        .await?;

    info!("cattery server stopped");
    Ok(())
}

/// Resolve on SIGINT/SIGTERM, cancelling the background loops before the
/// HTTP server stops accepting connections.
async fn shutdown_signal(cancel: CancellationToken) {
    let interrupt = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        () = interrupt => info!("received SIGINT, shutting down"),
        () = terminate => info!("received SIGTERM, shutting down"),
    }
    cancel.cancel();
}
