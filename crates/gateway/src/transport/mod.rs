// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP transport for the session gateway.

pub mod cookies;
pub mod http;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::GatewayState;

/// Build the axum `Router` with all gateway routes.
pub fn build_router(state: Arc<GatewayState>) -> Router {
    Router::new()
        // Health (no cookies involved)
        .route("/api/v1/health", get(http::health))
        // Session resolution and teardown
        .route("/api/v1/session", get(http::get_session).delete(http::destroy_session))
        // Session establishment variants
        .route("/api/v1/session/login", post(http::establish_with_credentials))
        .route("/api/v1/session/oauth", post(http::establish_with_oauth))
        .route("/api/v1/session/tokens", post(http::establish_with_tokens))
        // Token rotation
        .route("/api/v1/session/reissue", post(http::reissue_session))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
