// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! imdsd: instance-metadata credential endpoint for hosts without one.
//!
//! Periodically assumes a role through an [`IdentityProvider`] and serves the
//! resulting short-lived credentials on the metadata routes SDKs poll.

pub mod config;
pub mod credential;
pub mod error;
pub mod state;
pub mod test_support;
pub mod transport;

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::credential::provider::{resolve_session_name, IdentityProvider};
use crate::credential::scheduler::RefreshScheduler;
use crate::credential::store::CredentialStore;
use crate::credential::sts::StsProvider;
use crate::state::ImdsState;
use crate::transport::build_router;

/// Run the service against STS until SIGINT or SIGTERM.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let shutdown = CancellationToken::new();
    spawn_signal_handler(shutdown.clone());

    let provider = Arc::new(StsProvider::from_profile(&config.source_profile).await);
    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
    serve(&config, provider, listener, shutdown).await
}

/// Serve the metadata routes on `listener` with credentials from `provider`
/// until `shutdown` fires.
///
/// The initial refresh completes before the first request is accepted.
pub async fn serve(
    config: &Config,
    provider: Arc<dyn IdentityProvider>,
    listener: TcpListener,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let session_name = resolve_session_name(
        provider.as_ref(),
        &config.default_session_name,
        config.provider_timeout(),
    )
    .await;

    let store = CredentialStore::new();
    let scheduler = RefreshScheduler::new(
        Arc::clone(&store),
        provider,
        config.role_arn.clone(),
        session_name,
        config.refresh_policy(),
    );

    tokio::select! {
        _ = shutdown.cancelled() => return Ok(()),
        _ = scheduler.bootstrap() => {}
    }
    let refresher = scheduler.spawn(shutdown.clone());

    let state = Arc::new(ImdsState::new(config.role_name.clone(), store.reader()));
    let addr = listener.local_addr()?;
    tracing::info!(%addr, role_name = %config.role_name, "imdsd listening");

    let result = axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown.clone().cancelled_owned())
        .await;

    shutdown.cancel();
    refresher.await?;
    result?;
    Ok(())
}

/// Cancel `shutdown` on SIGTERM or SIGINT.
fn spawn_signal_handler(shutdown: CancellationToken) {
    tokio::spawn(async move {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()).ok();
        let mut sigint =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt()).ok();

        tokio::select! {
            _ = async {
                if let Some(ref mut s) = sigterm { s.recv().await } else { std::future::pending().await }
            } => {
                tracing::info!("received SIGTERM");
            }
            _ = async {
                if let Some(ref mut s) = sigint { s.recv().await } else { std::future::pending().await }
            } => {
                tracing::info!("received SIGINT");
            }
        }
        shutdown.cancel();
    });
}
