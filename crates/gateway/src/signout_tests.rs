// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration as StdDuration;

use tokio::sync::broadcast::error::TryRecvError;

use super::*;
use crate::test_support::MockBackend;

/// Coordinator with a backend nothing will call (requests without a refresh
/// token never touch the network).
fn offline_coordinator() -> (SignOutCoordinator, broadcast::Receiver<SessionEvent>) {
    crate::test_support::install_crypto_provider();
    let backend = BackendClient::new("http://127.0.0.1:9".to_owned(), StdDuration::from_secs(1));
    let (event_tx, event_rx) = broadcast::channel(16);
    (SignOutCoordinator::new(backend, event_tx), event_rx)
}

#[tokio::test(start_paused = true)]
async fn first_call_signs_out_with_defaults() {
    let (coordinator, mut rx) = offline_coordinator();

    assert!(coordinator.sign_out_once(SignOutRequest::default()).await);
    assert_eq!(
        rx.try_recv(),
        Ok(SessionEvent::SignedOut { message: None, redirect_to: "/login".to_owned() })
    );
}

#[tokio::test(start_paused = true)]
async fn carries_message_and_redirect() {
    let (coordinator, mut rx) = offline_coordinator();

    let request = SignOutRequest {
        message: Some("Session expired.".to_owned()),
        redirect_to: Some("/goodbye".to_owned()),
        refresh_token: None,
    };
    assert!(coordinator.sign_out_once(request).await);
    assert_eq!(
        rx.try_recv(),
        Ok(SessionEvent::SignedOut {
            message: Some("Session expired.".to_owned()),
            redirect_to: "/goodbye".to_owned()
        })
    );
}

#[tokio::test(start_paused = true)]
async fn repeat_within_window_is_a_no_op() {
    let (coordinator, mut rx) = offline_coordinator();

    assert!(coordinator.sign_out_once(SignOutRequest::default()).await);
    assert!(!coordinator.sign_out_once(SignOutRequest::default()).await);

    assert!(matches!(rx.try_recv(), Ok(SessionEvent::SignedOut { .. })));
    assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
}

#[tokio::test(start_paused = true)]
async fn rearms_after_the_window_elapses() {
    let (coordinator, mut rx) = offline_coordinator();

    assert!(coordinator.sign_out_once(SignOutRequest::default()).await);
    tokio::time::advance(DEBOUNCE_WINDOW + Duration::from_millis(1)).await;
    assert!(coordinator.sign_out_once(SignOutRequest::default()).await);

    assert!(matches!(rx.try_recv(), Ok(SessionEvent::SignedOut { .. })));
    assert!(matches!(rx.try_recv(), Ok(SessionEvent::SignedOut { .. })));
    assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
}

#[tokio::test(start_paused = true)]
async fn concurrent_calls_collapse_to_one() {
    let (coordinator, mut rx) = offline_coordinator();

    let (a, b) = tokio::join!(
        coordinator.sign_out_once(SignOutRequest::default()),
        coordinator.sign_out_once(SignOutRequest::default()),
    );
    assert!(a != b, "exactly one of the two concurrent calls must win");

    assert!(matches!(rx.try_recv(), Ok(SessionEvent::SignedOut { .. })));
    assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
}

#[tokio::test]
async fn revokes_refresh_token_server_side() -> anyhow::Result<()> {
    let mock = MockBackend::builder().logout(vec![(204, String::new())]).spawn().await?;
    let backend = BackendClient::new(mock.base_url(), StdDuration::from_secs(5));
    let (event_tx, mut rx) = broadcast::channel(16);
    let coordinator = SignOutCoordinator::new(backend, event_tx);

    let request = SignOutRequest { refresh_token: Some("r1".to_owned()), ..Default::default() };
    assert!(coordinator.sign_out_once(request).await);
    assert_eq!(mock.logout_calls(), 1);
    assert!(matches!(rx.try_recv(), Ok(SessionEvent::SignedOut { .. })));
    Ok(())
}

#[tokio::test]
async fn backend_logout_failure_is_swallowed() -> anyhow::Result<()> {
    let mock = MockBackend::builder().logout(vec![(500, "{}".to_owned())]).spawn().await?;
    let backend = BackendClient::new(mock.base_url(), StdDuration::from_secs(5));
    let (event_tx, mut rx) = broadcast::channel(16);
    let coordinator = SignOutCoordinator::new(backend, event_tx);

    let request = SignOutRequest { refresh_token: Some("r1".to_owned()), ..Default::default() };
    // The sign-out still completes and still broadcasts.
    assert!(coordinator.sign_out_once(request).await);
    assert_eq!(mock.logout_calls(), 1);
    assert!(matches!(rx.try_recv(), Ok(SessionEvent::SignedOut { .. })));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn dropped_receivers_do_not_fail_sign_out() {
    let (coordinator, rx) = offline_coordinator();
    drop(rx);
    assert!(coordinator.sign_out_once(SignOutRequest::default()).await);
}
