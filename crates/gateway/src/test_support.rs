// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test infrastructure: a scripted mock portal backend.
//!
//! Each auth route plays back a list of `(status, body)` responses in call
//! order, repeating the last one when the script runs out, and counts how
//! often it was hit. The extra `/api/v1/resource` route stands in for any
//! bearer-authenticated portal API call.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use serde_json::json;
use tokio::net::TcpListener;

/// Install the process-wide rustls crypto provider. Tests build reqwest
/// clients without going through [`crate::run`], which normally installs it.
pub fn install_crypto_provider() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}

/// One route's scripted playback.
#[derive(Clone, Default)]
pub struct Script {
    responses: Arc<Vec<(u16, String)>>,
    calls: Arc<AtomicU32>,
    delay: Duration,
}

impl Script {
    fn new(responses: Vec<(u16, String)>, delay: Duration) -> Self {
        Self { responses: Arc::new(responses), calls: Arc::new(AtomicU32::new(0)), delay }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::Relaxed)
    }

    async fn respond(&self) -> (StatusCode, String) {
        let idx = self.calls.fetch_add(1, Ordering::Relaxed) as usize;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let (status, body) = self
            .responses
            .get(idx)
            .or_else(|| self.responses.last())
            .cloned()
            // Unscripted route: the test did not expect this call.
            .unwrap_or((500, r#"{"error":"unscripted route"}"#.to_owned()));
        (StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR), body)
    }
}

/// Configures which responses each backend route plays back.
#[derive(Default)]
pub struct MockBackendBuilder {
    login: Vec<(u16, String)>,
    oauth: Vec<(u16, String)>,
    reissue: Vec<(u16, String)>,
    me: Vec<(u16, String)>,
    logout: Vec<(u16, String)>,
    resource: Vec<(u16, String)>,
    reissue_delay: Duration,
}

impl MockBackendBuilder {
    pub fn login(mut self, responses: Vec<(u16, String)>) -> Self {
        self.login = responses;
        self
    }

    pub fn oauth(mut self, responses: Vec<(u16, String)>) -> Self {
        self.oauth = responses;
        self
    }

    pub fn reissue(mut self, responses: Vec<(u16, String)>) -> Self {
        self.reissue = responses;
        self
    }

    pub fn me(mut self, responses: Vec<(u16, String)>) -> Self {
        self.me = responses;
        self
    }

    pub fn logout(mut self, responses: Vec<(u16, String)>) -> Self {
        self.logout = responses;
        self
    }

    pub fn resource(mut self, responses: Vec<(u16, String)>) -> Self {
        self.resource = responses;
        self
    }

    /// Hold every reissue response for `delay`, so tests can force refresh
    /// calls to overlap.
    pub fn reissue_delay(mut self, delay: Duration) -> Self {
        self.reissue_delay = delay;
        self
    }

    pub async fn spawn(self) -> anyhow::Result<MockBackend> {
        MockBackend::spawn(self).await
    }
}

struct Routes {
    login: Script,
    oauth: Script,
    reissue: Script,
    me: Script,
    logout: Script,
    resource: Script,
    last_reissue_body: Mutex<Option<String>>,
    last_authorization: Mutex<Option<String>>,
}

/// A scripted portal backend listening on a real local socket.
pub struct MockBackend {
    addr: SocketAddr,
    routes: Arc<Routes>,
}

impl MockBackend {
    pub fn builder() -> MockBackendBuilder {
        MockBackendBuilder::default()
    }

    async fn spawn(builder: MockBackendBuilder) -> anyhow::Result<Self> {
        install_crypto_provider();
        let routes = Arc::new(Routes {
            login: Script::new(builder.login, Duration::ZERO),
            oauth: Script::new(builder.oauth, Duration::ZERO),
            reissue: Script::new(builder.reissue, builder.reissue_delay),
            me: Script::new(builder.me, Duration::ZERO),
            logout: Script::new(builder.logout, Duration::ZERO),
            resource: Script::new(builder.resource, Duration::ZERO),
            last_reissue_body: Mutex::new(None),
            last_authorization: Mutex::new(None),
        });

        let app = Router::new()
            .route(
                "/api/v1/auth/login",
                post(|State(r): State<Arc<Routes>>| async move { r.login.respond().await }),
            )
            .route(
                "/api/v1/auth/oauth",
                post(|State(r): State<Arc<Routes>>| async move { r.oauth.respond().await }),
            )
            .route(
                "/api/v1/auth/reissue",
                post(|State(r): State<Arc<Routes>>, body: String| async move {
                    if let Ok(mut last) = r.last_reissue_body.lock() {
                        *last = Some(body);
                    }
                    r.reissue.respond().await
                }),
            )
            .route(
                "/api/v1/users/me",
                get(|State(r): State<Arc<Routes>>, headers: HeaderMap| async move {
                    record_authorization(&r, &headers);
                    r.me.respond().await
                }),
            )
            .route(
                "/api/v1/auth/logout",
                post(|State(r): State<Arc<Routes>>| async move { r.logout.respond().await }),
            )
            .route(
                "/api/v1/resource",
                get(|State(r): State<Arc<Routes>>, headers: HeaderMap| async move {
                    record_authorization(&r, &headers);
                    r.resource.respond().await
                })
                .post(|State(r): State<Arc<Routes>>, headers: HeaderMap| async move {
                    record_authorization(&r, &headers);
                    r.resource.respond().await
                }),
            )
            .with_state(Arc::clone(&routes));

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Ok(Self { addr, routes })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn login_calls(&self) -> u32 {
        self.routes.login.calls()
    }

    pub fn oauth_calls(&self) -> u32 {
        self.routes.oauth.calls()
    }

    pub fn reissue_calls(&self) -> u32 {
        self.routes.reissue.calls()
    }

    pub fn me_calls(&self) -> u32 {
        self.routes.me.calls()
    }

    pub fn logout_calls(&self) -> u32 {
        self.routes.logout.calls()
    }

    pub fn resource_calls(&self) -> u32 {
        self.routes.resource.calls()
    }

    /// Raw JSON body of the most recent reissue request.
    pub fn last_reissue_body(&self) -> Option<String> {
        self.routes.last_reissue_body.lock().ok().and_then(|b| b.clone())
    }

    /// `Authorization` header of the most recent me/resource request.
    pub fn last_authorization(&self) -> Option<String> {
        self.routes.last_authorization.lock().ok().and_then(|a| a.clone())
    }
}

fn record_authorization(routes: &Routes, headers: &HeaderMap) {
    let auth = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    if let Ok(mut last) = routes.last_authorization.lock() {
        *last = auth;
    }
}

/// Backend token-pair response body.
pub fn pair_body(access: &str, refresh: &str) -> String {
    json!({ "accessToken": access, "refreshToken": refresh }).to_string()
}

/// Backend who-am-I response body.
pub fn user_body(id: i64, email: &str, name: &str) -> String {
    json!({ "id": id, "email": email, "name": name, "profileImage": null }).to_string()
}

/// A `header.payload.signature` token carrying the given claims.
pub fn token_with_claims(claims: serde_json::Value) -> String {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    format!("h.{}.s", URL_SAFE_NO_PAD.encode(claims.to_string()))
}
