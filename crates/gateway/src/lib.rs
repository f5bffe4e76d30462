// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Portalgate: session/token lifecycle gateway for the open-source portal
//! front end.
//!
//! The portal backend issues and verifies the access/refresh token pair;
//! this gateway acquires, stores (as http-only cookies), rotates, and
//! revokes it on behalf of the server-rendered front end.

pub mod backend;
pub mod claims;
pub mod client;
pub mod config;
pub mod error;
pub mod manager;
pub mod session;
pub mod signout;
pub mod state;
pub mod test_support;
pub mod transport;

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::config::GatewayConfig;
use crate::transport::build_router;

/// Run the session gateway until shutdown.
pub async fn run(config: GatewayConfig) -> anyhow::Result<()> {
    // reqwest is built with rustls-no-provider; a process-wide crypto
    // provider must be installed before the first TLS connection.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let addr = format!("{}:{}", config.host, config.port);
    let shutdown = CancellationToken::new();

    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("shutdown signal received");
                shutdown.cancel();
            }
        });
    }

    let state = Arc::new(state::GatewayState::new(config, shutdown.clone()));
    tracing::info!(backend_url = %state.config.backend_url, "portalgate listening on {addr}");

    let router = build_router(state);
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, router).with_graceful_shutdown(shutdown.cancelled_owned()).await?;

    Ok(())
}
