// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory token lifecycle: hold the current pair, detect expiry, and
//! perform deduplicated refresh-with-retry.
//!
//! The concurrency hazard is same-process concurrent `refresh()` callers
//! racing each other into parallel reissue round-trips, which would burn the
//! one-shot refresh token. [`TokenManager::refresh`] therefore single-flights:
//! the first caller starts the operation, every later caller awaits that same
//! operation's result, and at most one reissue is in flight per manager.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::{BoxFuture, Shared};
use futures_util::FutureExt;
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::backend::{BackendClient, BackendError};
use crate::claims;
use crate::session::{SessionEvent, TokenPair};
use crate::signout::{SignOutCoordinator, SignOutRequest};
use crate::state::epoch_ms;

/// Total reissue attempts per refresh (1 initial + 2 retries).
pub const REFRESH_ATTEMPTS: u32 = 3;

/// Linear backoff unit: the n-th failed attempt waits `n ×` this.
const BACKOFF_UNIT: Duration = Duration::from_millis(1000);

/// Window before expiry in which a proactive refresh should run (2 minutes).
pub const EXPIRY_MARGIN_MS: u64 = 2 * 60 * 1000;

/// Toast shown when the session cannot be refreshed.
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please sign in again.";

/// Injectable backoff delay, so tests can observe and skip the waits.
pub type DelayFn = Arc<dyn Fn(Duration) -> BoxFuture<'static, ()> + Send + Sync>;

fn default_delay() -> DelayFn {
    Arc::new(|d: Duration| tokio::time::sleep(d).boxed())
}

/// The held token triple. Expiry always describes the current access token.
struct TokenState {
    access_token: String,
    refresh_token: String,
    expires_at_ms: u64,
}

impl TokenState {
    fn new(access_token: String, refresh_token: String) -> Self {
        let expires_at_ms = claims::expires_at_ms(&access_token);
        Self { access_token, refresh_token, expires_at_ms }
    }
}

type SharedRefresh = Shared<BoxFuture<'static, Option<String>>>;

struct ManagerInner {
    backend: BackendClient,
    signout: SignOutCoordinator,
    event_tx: broadcast::Sender<SessionEvent>,
    tokens: RwLock<Option<TokenState>>,
    /// Single-flight slot: the in-progress refresh, if any.
    inflight: Mutex<Option<SharedRefresh>>,
    /// Terminal refresh failures since the last success. Observability only.
    consecutive_failures: AtomicU32,
    delay: DelayFn,
}

/// Per-client-session token coordinator. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct TokenManager {
    inner: Arc<ManagerInner>,
}

impl TokenManager {
    pub fn new(
        backend: BackendClient,
        signout: SignOutCoordinator,
        event_tx: broadcast::Sender<SessionEvent>,
    ) -> Self {
        Self::with_delay(backend, signout, event_tx, default_delay())
    }

    /// Like [`TokenManager::new`] with an explicit backoff delay function.
    pub fn with_delay(
        backend: BackendClient,
        signout: SignOutCoordinator,
        event_tx: broadcast::Sender<SessionEvent>,
        delay: DelayFn,
    ) -> Self {
        Self {
            inner: Arc::new(ManagerInner {
                backend,
                signout,
                event_tx,
                tokens: RwLock::new(None),
                inflight: Mutex::new(None),
                consecutive_failures: AtomicU32::new(0),
                delay,
            }),
        }
    }

    /// Install a token pair, recomputing expiry from the access token.
    /// No network call; the failure counter resets.
    pub async fn initialize(&self, access_token: String, refresh_token: String) {
        let state = TokenState::new(access_token, refresh_token);
        debug!(expires_at_ms = state.expires_at_ms, "token manager initialized");
        *self.inner.tokens.write().await = Some(state);
        self.inner.consecutive_failures.store(0, Ordering::Relaxed);
    }

    /// The currently held access token, if any.
    pub async fn access_token(&self) -> Option<String> {
        self.inner.tokens.read().await.as_ref().map(|t| t.access_token.clone())
    }

    /// Whether the access token is inside the proactive-refresh window.
    /// Holding no token counts as expiring.
    pub async fn is_expiring_soon(&self) -> bool {
        match self.inner.tokens.read().await.as_ref() {
            Some(t) => epoch_ms() + EXPIRY_MARGIN_MS >= t.expires_at_ms,
            None => true,
        }
    }

    /// Whether the access token is past its expiry (or absent).
    pub async fn is_expired(&self) -> bool {
        match self.inner.tokens.read().await.as_ref() {
            Some(t) => epoch_ms() >= t.expires_at_ms,
            None => true,
        }
    }

    /// Drop the held tokens without any backend call.
    pub async fn clear(&self) {
        *self.inner.tokens.write().await = None;
    }

    /// Terminal refresh failures since the last success.
    pub fn consecutive_failures(&self) -> u32 {
        self.inner.consecutive_failures.load(Ordering::Relaxed)
    }

    /// Subscribe to rotation and sign-out events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.event_tx.subscribe()
    }

    /// Rotate the token pair, returning the new access token.
    ///
    /// Concurrent callers join the in-flight operation and all observe its
    /// result. Transient backend failures are retried up to
    /// [`REFRESH_ATTEMPTS`] times total with linear backoff; a 401/403 from
    /// the reissue endpoint means the refresh token itself is dead and skips
    /// straight to the terminal path. On terminal failure the held state is
    /// cleared and the sign-out coordinator fires, then `None` is returned.
    /// Returns `None` immediately, without any network call, when no tokens
    /// are held.
    pub async fn refresh(&self) -> Option<String> {
        if self.inner.tokens.read().await.is_none() {
            return None;
        }

        let operation = {
            let mut inflight = self.inner.inflight.lock().await;
            match inflight.as_ref() {
                Some(existing) => existing.clone(),
                None => {
                    let inner = Arc::clone(&self.inner);
                    // Spawned, so a caller dropping mid-await cannot stall
                    // the rotation for the callers still waiting on it.
                    let task = tokio::spawn(run_refresh(inner));
                    let shared: SharedRefresh =
                        async move { task.await.unwrap_or(None) }.boxed().shared();
                    *inflight = Some(shared.clone());
                    shared
                }
            }
        };

        operation.await
    }
}

/// The single-flight body: one reissue-with-retries round, then state and
/// event updates. Exactly one of these runs per inflight slot occupancy.
async fn run_refresh(inner: Arc<ManagerInner>) -> Option<String> {
    let held = {
        let tokens = inner.tokens.read().await;
        tokens.as_ref().map(|t| (t.access_token.clone(), t.refresh_token.clone()))
    };

    let token = match held {
        // Cleared between scheduling and execution; nothing to rotate.
        None => None,
        Some((stale_access, refresh_token)) => {
            match reissue_with_retries(&inner, &refresh_token, &stale_access).await {
                Ok(pair) => {
                    let access = pair.access_token.clone();
                    *inner.tokens.write().await =
                        Some(TokenState::new(pair.access_token.clone(), pair.refresh_token.clone()));
                    inner.consecutive_failures.store(0, Ordering::Relaxed);
                    info!("access token rotated");
                    // Best-effort notification; a missing mirror must not
                    // fail the refresh.
                    let _ = inner.event_tx.send(SessionEvent::Rotated {
                        access_token: pair.access_token,
                        refresh_token: pair.refresh_token,
                    });
                    Some(access)
                }
                Err(e) => {
                    let failures = inner.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;
                    warn!(failures, error = %e, "token refresh failed terminally; signing out");
                    let held_refresh =
                        inner.tokens.write().await.take().map(|t| t.refresh_token);
                    inner
                        .signout
                        .sign_out_once(SignOutRequest {
                            message: Some(SESSION_EXPIRED_MESSAGE.to_owned()),
                            redirect_to: None,
                            refresh_token: held_refresh,
                        })
                        .await;
                    None
                }
            }
        }
    };

    *inner.inflight.lock().await = None;
    token
}

/// One bounded retry loop around the backend reissue call.
async fn reissue_with_retries(
    inner: &ManagerInner,
    refresh_token: &str,
    stale_access: &str,
) -> Result<TokenPair, BackendError> {
    let mut last_error = BackendError::Transport("no attempts made".to_owned());

    for attempt in 1..=REFRESH_ATTEMPTS {
        match inner.backend.reissue(refresh_token, Some(stale_access)).await {
            Ok(pair) => return Ok(pair),
            Err(e) if e.is_denied() => {
                warn!(error = %e, "reissue denied; refresh token is no longer valid");
                return Err(e);
            }
            Err(e) => {
                warn!(attempt, max = REFRESH_ATTEMPTS, error = %e, "reissue failed, retrying");
                last_error = e;
                if attempt < REFRESH_ATTEMPTS {
                    (inner.delay)(BACKOFF_UNIT * attempt).await;
                }
            }
        }
    }

    Err(last_error)
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
