// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP handlers for the session boundary.
//!
//! Handlers are request-scoped: the cookie pair is the only state shared
//! across requests, so every handler re-reads it fresh and rewrites it (or
//! clears it) as a unit.

use std::sync::Arc;

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::backend::BackendError;
use crate::error::AuthError;
use crate::session::{SessionRecord, TokenPair};
use crate::state::GatewayState;
use crate::transport::cookies;

const BACKEND_UNAVAILABLE_MESSAGE: &str = "The portal backend is unavailable. Try again shortly.";

// -- Request/Response types ---------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct OauthRequest {
    pub provider: String,
    pub access_token: String,
}

#[derive(Debug, Deserialize)]
pub struct TokensRequest {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session: Option<SessionRecord>,
}

#[derive(Debug, Serialize)]
pub struct SignedOutResponse {
    pub signed_out: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub backend_url: String,
}

fn session_response(record: SessionRecord) -> Response {
    Json(SessionResponse { session: Some(record) }).into_response()
}

fn no_session() -> Response {
    Json(SessionResponse { session: None }).into_response()
}

fn backend_unavailable() -> Response {
    AuthError::BackendUnavailable.to_http_response(BACKEND_UNAVAILABLE_MESSAGE).into_response()
}

// -- Handlers -----------------------------------------------------------------

/// `GET /api/v1/health`
pub async fn health(State(s): State<Arc<GatewayState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "running".to_owned(),
        backend_url: s.config.backend_url.clone(),
    })
}

/// `GET /api/v1/session` — resolve the cookie pair into a session.
///
/// No cookies means no session and no backend call. An access token the
/// backend rejects gets exactly one reissue with the refresh cookie; a
/// denied reissue clears both cookies. Any other backend failure reports
/// no session and leaves the cookies alone, since they may still be good.
pub async fn get_session(
    State(s): State<Arc<GatewayState>>,
    jar: CookieJar,
) -> (CookieJar, Response) {
    let access = cookies::access_token(&jar);
    let refresh = cookies::refresh_token(&jar);

    if access.is_none() && refresh.is_none() {
        return (jar, no_session());
    }
    // A session cannot outlive its refresh token.
    let Some(refresh) = refresh else {
        return (jar, no_session());
    };
    let access = access.unwrap_or_default();

    match s.backend.me(&access).await {
        Ok(user) => {
            let record = SessionRecord::from_parts(
                user.into(),
                TokenPair { access_token: access, refresh_token: refresh },
            );
            (jar, session_response(record))
        }
        Err(e) if e.is_denied() => reissue_and_rebuild(&s, jar, &refresh, &access).await,
        Err(e) => {
            warn!(error = %e, "who-am-I failed; reporting no session");
            (jar, no_session())
        }
    }
}

/// The one reissue attempt a session read gets after a rejected access token.
async fn reissue_and_rebuild(
    s: &GatewayState,
    jar: CookieJar,
    refresh: &str,
    stale_access: &str,
) -> (CookieJar, Response) {
    let stale = (!stale_access.is_empty()).then_some(stale_access);
    match s.backend.reissue(refresh, stale).await {
        Ok(pair) => {
            // The rotated pair is valid whatever who-am-I says next;
            // persist it before fetching the identity.
            let jar = cookies::store_pair(jar, &pair, s.config.cookies_secure());
            match s.backend.me(&pair.access_token).await {
                Ok(user) => {
                    info!("session reissued during read");
                    (jar, session_response(SessionRecord::from_parts(user.into(), pair)))
                }
                Err(e) => {
                    warn!(error = %e, "who-am-I failed after reissue");
                    (jar, no_session())
                }
            }
        }
        Err(e) if e.is_denied() => {
            debug!(error = %e, "reissue denied; clearing session cookies");
            let jar = cookies::clear_pair(jar, s.config.cookies_secure());
            (jar, no_session())
        }
        Err(e) => {
            warn!(error = %e, "reissue failed; reporting no session");
            (jar, no_session())
        }
    }
}

/// `POST /api/v1/session/login` — establish a session from credentials.
pub async fn establish_with_credentials(
    State(s): State<Arc<GatewayState>>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> (CookieJar, Response) {
    let email = req.email.trim();
    if email.is_empty() || req.password.is_empty() {
        return (
            jar,
            AuthError::BadRequest
                .to_http_response("Email and password are required.")
                .into_response(),
        );
    }

    match s.backend.login(email, &req.password).await {
        Ok(pair) => establish(&s, jar, pair).await,
        // Unknown accounts get the same answer as wrong passwords.
        Err(BackendError::NotFound) => {
            (jar, invalid_credentials())
        }
        Err(e) if e.is_denied() => {
            debug!(email = %email, "login rejected");
            (jar, invalid_credentials())
        }
        Err(e) => {
            warn!(error = %e, "login failed");
            (jar, backend_unavailable())
        }
    }
}

fn invalid_credentials() -> Response {
    AuthError::InvalidCredentials
        .to_http_response("Invalid email or password.")
        .into_response()
}

/// `POST /api/v1/session/oauth` — establish a session from a provider token.
pub async fn establish_with_oauth(
    State(s): State<Arc<GatewayState>>,
    jar: CookieJar,
    Json(req): Json<OauthRequest>,
) -> (CookieJar, Response) {
    if req.provider.is_empty() || req.access_token.is_empty() {
        return (
            jar,
            AuthError::BadRequest
                .to_http_response("Provider and access token are required.")
                .into_response(),
        );
    }

    match s.backend.oauth_login(&req.provider, &req.access_token).await {
        Ok(pair) => establish(&s, jar, pair).await,
        Err(BackendError::NotFound) => (
            jar,
            AuthError::AccountNotRegistered
                .to_http_response("No account is registered for this social login.")
                .into_response(),
        ),
        Err(e) if e.is_denied() => (
            jar,
            AuthError::InvalidToken.to_http_response("Invalid or expired token.").into_response(),
        ),
        Err(e) => {
            warn!(error = %e, provider = %req.provider, "oauth login failed");
            (jar, backend_unavailable())
        }
    }
}

/// `POST /api/v1/session/tokens` — establish a session from a pre-issued
/// pair (the OAuth callback page hand-off).
pub async fn establish_with_tokens(
    State(s): State<Arc<GatewayState>>,
    jar: CookieJar,
    Json(req): Json<TokensRequest>,
) -> (CookieJar, Response) {
    if req.access_token.is_empty() || req.refresh_token.is_empty() {
        return (
            jar,
            AuthError::BadRequest
                .to_http_response("Both tokens are required.")
                .into_response(),
        );
    }

    let pair = TokenPair { access_token: req.access_token, refresh_token: req.refresh_token };
    establish(&s, jar, pair).await
}

/// Validate an issued pair via who-am-I, then persist it and return the
/// session. Shared tail of every establish variant.
async fn establish(s: &GatewayState, jar: CookieJar, pair: TokenPair) -> (CookieJar, Response) {
    match s.backend.me(&pair.access_token).await {
        Ok(user) => {
            let jar = cookies::store_pair(jar, &pair, s.config.cookies_secure());
            let record = SessionRecord::from_parts(user.into(), pair);
            info!(user_id = record.user.id, "session established");
            (jar, session_response(record))
        }
        Err(e) if e.is_denied() => (
            jar,
            AuthError::InvalidToken.to_http_response("Invalid or expired token.").into_response(),
        ),
        Err(e) => {
            warn!(error = %e, "who-am-I failed during session establishment");
            (jar, backend_unavailable())
        }
    }
}

/// `POST /api/v1/session/reissue` — rotate the pair behind the cookies.
///
/// On any failure the cookies are deleted: a reissue is only requested when
/// the access token already stopped working, so a pair that cannot rotate
/// is dead weight.
pub async fn reissue_session(
    State(s): State<Arc<GatewayState>>,
    jar: CookieJar,
) -> (CookieJar, Response) {
    let Some(refresh) = cookies::refresh_token(&jar) else {
        let jar = cookies::clear_pair(jar, s.config.cookies_secure());
        return (
            jar,
            AuthError::SessionExpired.to_http_response("No session to reissue.").into_response(),
        );
    };
    let stale_access = cookies::access_token(&jar);

    match s.backend.reissue(&refresh, stale_access.as_deref()).await {
        Ok(pair) => {
            let jar = cookies::store_pair(jar, &pair, s.config.cookies_secure());
            info!("session reissued");
            (jar, Json(pair).into_response())
        }
        Err(e) => {
            let jar = cookies::clear_pair(jar, s.config.cookies_secure());
            if e.is_denied() {
                debug!(error = %e, "reissue denied; session cookies cleared");
                (
                    jar,
                    AuthError::SessionExpired
                        .to_http_response("Session expired. Please sign in again.")
                        .into_response(),
                )
            } else {
                warn!(error = %e, "reissue failed; session cookies cleared");
                (jar, backend_unavailable())
            }
        }
    }
}

/// `DELETE /api/v1/session` — tear the session down.
///
/// The backend logout is best-effort: revocation failure never blocks the
/// local teardown, and both cookies are deleted unconditionally.
pub async fn destroy_session(
    State(s): State<Arc<GatewayState>>,
    jar: CookieJar,
) -> (CookieJar, Response) {
    if let Some(refresh) = cookies::refresh_token(&jar) {
        if let Err(e) = s.backend.logout(&refresh).await {
            debug!(error = %e, "backend logout failed; clearing cookies anyway");
        }
    }
    let jar = cookies::clear_pair(jar, s.config.cookies_secure());
    info!("session destroyed");
    (jar, Json(SignedOutResponse { signed_out: true }).into_response())
}
