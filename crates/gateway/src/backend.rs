// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP client for the portal backend's auth endpoints.
//!
//! The backend issues, rotates, and revokes the token pair; this client only
//! shapes requests and classifies failures. A 401/403 means the presented
//! credential was rejected outright ([`BackendError::Denied`]) — callers
//! must not retry those.

use std::fmt;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use crate::session::{SessionUser, TokenPair};

/// Failure classes for backend calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// 401/403: the presented credential was rejected. Non-retriable.
    Denied(u16),
    /// 404: no account matches the presented identity.
    NotFound,
    /// Any other non-success status, with the raw body for logging.
    Status(u16, String),
    /// Connection, timeout, or body decode failure.
    Transport(String),
}

impl BackendError {
    pub fn is_denied(&self) -> bool {
        matches!(self, Self::Denied(_))
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Denied(status) => write!(f, "denied: HTTP {status}"),
            Self::NotFound => write!(f, "not found"),
            Self::Status(status, body) => write!(f, "HTTP {status}: {body}"),
            Self::Transport(msg) => write!(f, "transport: {msg}"),
        }
    }
}

impl std::error::Error for BackendError {}

/// Who-am-I response from the backend.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendUser {
    pub id: i64,
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub profile_image: Option<String>,
}

impl From<BackendUser> for SessionUser {
    fn from(user: BackendUser) -> Self {
        Self {
            id: user.id,
            email: user.email,
            display_name: user.name,
            avatar_url: user.profile_image,
        }
    }
}

/// HTTP client wrapper for the portal backend.
#[derive(Clone)]
pub struct BackendClient {
    base_url: String,
    client: Client,
}

impl BackendClient {
    pub fn new(base_url: String, timeout: Duration) -> Self {
        let client = Client::builder().timeout(timeout).build().unwrap_or_default();
        Self { base_url, client }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Exchange email/password credentials for a token pair.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair, BackendError> {
        let req = self
            .client
            .post(self.url("/api/v1/auth/login"))
            .json(&json!({ "email": email, "password": password }));
        execute(req).await
    }

    /// Exchange a provider-issued OAuth access token for a token pair.
    pub async fn oauth_login(
        &self,
        provider: &str,
        provider_token: &str,
    ) -> Result<TokenPair, BackendError> {
        let req = self
            .client
            .post(self.url("/api/v1/auth/oauth"))
            .json(&json!({ "provider": provider, "accessToken": provider_token }));
        execute(req).await
    }

    /// Rotate the pair: trade a refresh token (plus the stale access token,
    /// when still held, for backend-side bookkeeping) for a fresh pair.
    pub async fn reissue(
        &self,
        refresh_token: &str,
        stale_access_token: Option<&str>,
    ) -> Result<TokenPair, BackendError> {
        let mut body = json!({ "refreshToken": refresh_token });
        if let Some(access) = stale_access_token {
            body["accessToken"] = json!(access);
        }
        let req = self.client.post(self.url("/api/v1/auth/reissue")).json(&body);
        execute(req).await
    }

    /// Fetch the identity behind an access token.
    pub async fn me(&self, access_token: &str) -> Result<BackendUser, BackendError> {
        let req = self.client.get(self.url("/api/v1/users/me")).bearer_auth(access_token);
        execute(req).await
    }

    /// Invalidate a refresh token server-side. Call sites treat failures as
    /// best-effort — local teardown proceeds regardless.
    pub async fn logout(&self, refresh_token: &str) -> Result<(), BackendError> {
        let resp = self
            .client
            .post(self.url("/api/v1/auth/logout"))
            .json(&json!({ "refreshToken": refresh_token }))
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        Err(classify(status, body))
    }
}

/// Send a request and decode a JSON body, classifying non-success statuses.
pub(crate) async fn execute<T: DeserializeOwned>(
    req: reqwest::RequestBuilder,
) -> Result<T, BackendError> {
    let resp = req.send().await.map_err(|e| BackendError::Transport(e.to_string()))?;
    let status = resp.status();
    if status.is_success() {
        return resp.json().await.map_err(|e| BackendError::Transport(e.to_string()));
    }
    let body = resp.text().await.unwrap_or_default();
    Err(classify(status, body))
}

fn classify(status: StatusCode, body: String) -> BackendError {
    match status.as_u16() {
        401 | 403 => BackendError::Denied(status.as_u16()),
        404 => BackendError::NotFound,
        code => BackendError::Status(code, body),
    }
}

#[cfg(test)]
#[path = "backend_tests.rs"]
mod tests;
