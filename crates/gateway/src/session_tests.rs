// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::json;

use super::*;
use crate::state::epoch_ms;

fn user() -> SessionUser {
    SessionUser {
        id: 7,
        email: "park@knu.ac.kr".to_owned(),
        display_name: "Park Jiyoung".to_owned(),
        avatar_url: None,
    }
}

fn token_with_claims(claims: serde_json::Value) -> String {
    format!("h.{}.s", URL_SAFE_NO_PAD.encode(claims.to_string()))
}

#[test]
fn from_parts_derives_expiry_and_admin_from_access_token() {
    let access = token_with_claims(json!({"exp": 1_700_000_000, "isAdmin": true}));
    let record = SessionRecord::from_parts(
        user(),
        TokenPair { access_token: access.clone(), refresh_token: "r1".to_owned() },
    );
    assert_eq!(record.access_token, access);
    assert_eq!(record.refresh_token, "r1");
    assert_eq!(record.access_token_expires_at_ms, 1_700_000_000_000);
    assert!(record.can_access_admin);
}

#[test]
fn from_parts_fails_closed_on_opaque_access_token() {
    let before = epoch_ms();
    let record = SessionRecord::from_parts(
        user(),
        TokenPair { access_token: "opaque".to_owned(), refresh_token: "r1".to_owned() },
    );
    assert!(!record.can_access_admin);
    assert!(record.access_token_expires_at_ms >= before + crate::claims::EXPIRY_FALLBACK_MS);
}

#[test]
fn token_pair_uses_backend_wire_names() -> anyhow::Result<()> {
    let pair: TokenPair =
        serde_json::from_value(json!({"accessToken": "a", "refreshToken": "r"}))?;
    assert_eq!(pair.access_token, "a");
    assert_eq!(pair.refresh_token, "r");
    let out = serde_json::to_value(&pair)?;
    assert_eq!(out, json!({"accessToken": "a", "refreshToken": "r"}));
    Ok(())
}

#[test]
fn session_user_omits_absent_avatar() -> anyhow::Result<()> {
    let out = serde_json::to_value(user())?;
    assert!(out.get("avatar_url").is_none());
    let parsed: SessionUser = serde_json::from_value(json!({
        "id": 7, "email": "park@knu.ac.kr", "display_name": "Park Jiyoung"
    }))?;
    assert_eq!(parsed, user());
    Ok(())
}
