// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use amour_paywall_server::{
    api::router,
    auth::JwksManager,
    config::AppConfig,
    logging::init_logging,
    state::{AppState, AuthConfig},
    storage::StoragePaths,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = AppConfig::from_env()?;
    init_logging(config.log_format);

    let auth_config = build_auth_config(&config).await?;

    let state = AppState::open(StoragePaths::new(&config.data_dir), config.cache)
        .await?
        .with_auth_config(auth_config);
    tracing::info!(data_dir = %config.data_dir.display(), "Storage opened");

    let app = router(state);

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "Paywall server listening (docs at /docs)");

    let shutdown = CancellationToken::new();
    tokio::spawn(watch_signals(shutdown.clone()));

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn build_auth_config(config: &AppConfig) -> Result<AuthConfig, BoxError> {
    let jwks = match &config.jwks_url {
        Some(url) => {
            let manager = JwksManager::new(url.clone())?;
            // Warm the key cache; verification retries the fetch on demand.
            if let Err(e) = manager.refresh().await {
                tracing::warn!(error = %e, "Initial JWKS fetch failed");
            }
            Some(Arc::new(manager))
        }
        None => {
            tracing::warn!(
                "JWKS_URL not set; bearer tokens are rejected unless built with the dev feature"
            );
            None
        }
    };

    Ok(AuthConfig {
        jwks,
        issuer: config.jwt_issuer.clone(),
        audience: config.jwt_audience.clone(),
    })
}

async fn watch_signals(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
    shutdown.cancel();
}
