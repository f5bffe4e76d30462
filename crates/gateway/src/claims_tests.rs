// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use proptest::prelude::*;
use serde_json::json;

use super::*;

/// Build a `header.payload.signature` token around a raw payload string.
fn token_with_payload(payload: &str) -> String {
    format!("x.{}.y", PAYLOAD_B64.encode(payload))
}

fn token_with_claims(claims: serde_json::Value) -> String {
    token_with_payload(&claims.to_string())
}

// -- decode_claims --

#[test]
fn decodes_payload_of_three_segment_token() {
    let token = token_with_claims(json!({"exp": 1, "isAdmin": true}));
    let claims = decode_claims(&token).unwrap();
    assert_eq!(claims.get("exp"), Some(&json!(1)));
    assert_eq!(claims.get("isAdmin"), Some(&json!(true)));
}

#[test]
fn decodes_with_only_two_segments() {
    let payload = PAYLOAD_B64.encode(r#"{"exp":5}"#);
    let claims = decode_claims(&format!("header.{payload}")).unwrap();
    assert_eq!(claims.get("exp"), Some(&json!(5)));
}

#[test]
fn accepts_padded_and_unpadded_payloads() {
    // "{"a":1}" is 7 bytes, so strict base64 requires a `=` pad.
    let unpadded = "eyJhIjoxfQ";
    let padded = "eyJhIjoxfQ==";
    assert!(decode_claims(&format!("x.{unpadded}.y")).is_some());
    assert!(decode_claims(&format!("x.{padded}.y")).is_some());
}

#[yare::parameterized(
    empty          = { "" },
    one_segment    = { "justonesegment" },
    bad_base64     = { "x.!!!not-base64!!!.y" },
    not_json       = { "x.bm90IGpzb24.y" },
    json_array     = { "x.WzEsMl0.y" },
    json_scalar    = { "x.NDI.y" },
)]
fn undecodable_tokens_yield_none(token: &str) {
    assert!(decode_claims(token).is_none());
}

// -- expires_at_ms --

#[test]
fn exp_in_seconds_scales_to_millis() {
    // Payload {"exp":1700000000} — the claim is in seconds.
    let token = "x.eyJleHAiOjE3MDAwMDAwMDB9.y";
    assert_eq!(expires_at_ms(token), 1_700_000_000_000);
}

#[yare::parameterized(
    seconds              = { json!(1_700_000_000u64), 1_700_000_000_000 },
    millis               = { json!(1_700_000_000_000u64), 1_700_000_000_000 },
    at_threshold_seconds = { json!(10_000_000_000u64), 10_000_000_000_000 },
    above_threshold_ms   = { json!(10_000_000_001u64), 10_000_000_001 },
    numeric_string       = { json!("1700000000"), 1_700_000_000_000 },
    fractional_seconds   = { json!(1_700_000_000.5), 1_700_000_000_500 },
)]
fn exp_claim_normalizes_to_millis(exp: serde_json::Value, expected: u64) {
    let token = token_with_claims(json!({ "exp": exp }));
    assert_eq!(expires_at_ms(&token), expected);
}

#[yare::parameterized(
    no_exp          = { json!({"sub": "u1"}) },
    exp_null        = { json!({"exp": null}) },
    exp_bool        = { json!({"exp": true}) },
    exp_unparseable = { json!({"exp": "soon"}) },
)]
fn unusable_exp_falls_back_to_thirty_minutes(claims: serde_json::Value) {
    let token = token_with_claims(claims);
    let before = epoch_ms();
    let got = expires_at_ms(&token);
    let after = epoch_ms();
    assert!(got >= before + EXPIRY_FALLBACK_MS);
    assert!(got <= after + EXPIRY_FALLBACK_MS);
}

#[test]
fn garbage_token_falls_back_to_thirty_minutes() {
    let before = epoch_ms();
    let got = expires_at_ms("not even close to a token");
    let after = epoch_ms();
    assert!(got >= before + EXPIRY_FALLBACK_MS);
    assert!(got <= after + EXPIRY_FALLBACK_MS);
}

// -- admin_flag --

#[yare::parameterized(
    admin_true    = { json!({"isAdmin": true}), true },
    admin_false   = { json!({"isAdmin": false}), false },
    admin_absent  = { json!({"sub": "u1"}), false },
    admin_string  = { json!({"isAdmin": "true"}), false },
    admin_number  = { json!({"isAdmin": 1}), false },
)]
fn admin_flag_fails_closed(claims: serde_json::Value, expected: bool) {
    let token = token_with_claims(claims);
    assert_eq!(admin_flag(&token), expected);
}

#[test]
fn admin_flag_false_on_undecodable_token() {
    assert!(!admin_flag("x.y"));
    assert!(!admin_flag(""));
}

// -- robustness --

proptest! {
    #[test]
    fn never_panics_on_arbitrary_input(token in ".*") {
        let _ = decode_claims(&token);
        let _ = expires_at_ms(&token);
        let _ = admin_flag(&token);
    }
}
