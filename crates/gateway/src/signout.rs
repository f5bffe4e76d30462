// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Debounced, idempotent sign-out.
//!
//! Terminal refresh failures and explicit user sign-outs both land here.
//! Concurrent failure paths (two parallel requests each hitting a 401) must
//! collapse into a single teardown, so repeat calls within the debounce
//! window are no-ops.

use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};
use tokio::time::{Duration, Instant};
use tracing::{debug, info};

use crate::backend::BackendClient;
use crate::session::SessionEvent;

/// Where subscribers should navigate when no explicit target is given.
pub const DEFAULT_REDIRECT: &str = "/login";

/// Repeat invocations within this window are ignored.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_secs(3);

/// One sign-out trigger.
#[derive(Debug, Clone, Default)]
pub struct SignOutRequest {
    /// Message for the UI to surface; `None` for a silent sign-out.
    pub message: Option<String>,
    /// Navigation target after teardown; defaults to [`DEFAULT_REDIRECT`].
    pub redirect_to: Option<String>,
    /// Refresh token to revoke server-side, when one is still held.
    pub refresh_token: Option<String>,
}

struct CoordinatorInner {
    backend: BackendClient,
    event_tx: broadcast::Sender<SessionEvent>,
    last_signout: Mutex<Option<Instant>>,
}

/// Debounced sign-out trigger shared by the token manager and explicit
/// user actions. Clones share one debounce window.
#[derive(Clone)]
pub struct SignOutCoordinator {
    inner: Arc<CoordinatorInner>,
}

impl SignOutCoordinator {
    pub fn new(backend: BackendClient, event_tx: broadcast::Sender<SessionEvent>) -> Self {
        Self {
            inner: Arc::new(CoordinatorInner {
                backend,
                event_tx,
                last_signout: Mutex::new(None),
            }),
        }
    }

    /// Tear the session down once.
    ///
    /// Returns `false` when a sign-out already ran within the debounce
    /// window. Otherwise attempts a backend logout (failure is swallowed —
    /// reaching the logged-out state must not depend on the network) and
    /// broadcasts [`SessionEvent::SignedOut`]. Never errors.
    pub async fn sign_out_once(&self, request: SignOutRequest) -> bool {
        {
            let mut last = self.inner.last_signout.lock().await;
            if let Some(previous) = *last {
                if previous.elapsed() < DEBOUNCE_WINDOW {
                    debug!("sign-out already triggered; ignoring repeat");
                    return false;
                }
            }
            *last = Some(Instant::now());
        }

        if let Some(refresh_token) = request.refresh_token.as_deref() {
            if let Err(e) = self.inner.backend.logout(refresh_token).await {
                debug!(error = %e, "backend logout failed during sign-out");
            }
        }

        let redirect_to =
            request.redirect_to.unwrap_or_else(|| DEFAULT_REDIRECT.to_owned());
        info!(redirect_to = %redirect_to, "signed out");
        let _ = self
            .inner
            .event_tx
            .send(SessionEvent::SignedOut { message: request.message, redirect_to });

        true
    }
}

#[cfg(test)]
#[path = "signout_tests.rs"]
mod tests;
