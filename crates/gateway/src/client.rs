// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Authenticated portal API client.
//!
//! The request path every signed-in UI action takes: pull a current access
//! token from the [`TokenManager`] (rotating proactively inside the expiry
//! window), attach it as a bearer, and if the backend still rejects it
//! mid-flight, rotate once and retry once.

use std::time::Duration;

use reqwest::{Client, Method};
use serde_json::Value;
use tracing::debug;

use crate::backend::{execute, BackendError};
use crate::manager::TokenManager;

/// Bearer-authenticated client for portal API calls.
#[derive(Clone)]
pub struct PortalClient {
    base_url: String,
    manager: TokenManager,
    client: Client,
}

impl PortalClient {
    pub fn new(base_url: String, manager: TokenManager, timeout: Duration) -> Self {
        let client = Client::builder().timeout(timeout).build().unwrap_or_default();
        Self { base_url, manager, client }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET a JSON resource with bearer auth.
    pub async fn get_json(&self, path: &str) -> Result<Value, BackendError> {
        self.request(Method::GET, path, None).await
    }

    /// POST a JSON body with bearer auth and return the response body.
    pub async fn post_json(&self, path: &str, body: &Value) -> Result<Value, BackendError> {
        self.request(Method::POST, path, Some(body)).await
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, BackendError> {
        let token = self.current_token().await.ok_or(BackendError::Denied(401))?;

        match execute(self.build(method.clone(), path, body, &token)).await {
            // The token went stale between our expiry check and the backend's:
            // rotate once and retry once. A failed rotation has already
            // escalated to sign-out inside the manager.
            Err(BackendError::Denied(401)) => {
                debug!(path, "request rejected; rotating token and retrying");
                let token = self.manager.refresh().await.ok_or(BackendError::Denied(401))?;
                execute(self.build(method, path, body, &token)).await
            }
            other => other,
        }
    }

    /// Current access token, refreshing first when inside the expiry window.
    async fn current_token(&self) -> Option<String> {
        if self.manager.is_expiring_soon().await {
            if let Some(token) = self.manager.refresh().await {
                return Some(token);
            }
        }
        self.manager.access_token().await
    }

    fn build(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        token: &str,
    ) -> reqwest::RequestBuilder {
        let mut req = self.client.request(method, self.url(path)).bearer_auth(token);
        if let Some(body) = body {
            req = req.json(body);
        }
        req
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
