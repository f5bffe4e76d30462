// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Unverified bearer-token payload inspection.
//!
//! The backend signs and verifies tokens; this module only peeks at the
//! payload segment to derive a local expiry estimate and a coarse admin
//! hint. Decode failures are never errors — callers fall back to
//! conservative defaults.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::{DecodePaddingMode, Engine};
use serde_json::{Map, Value};

use crate::state::epoch_ms;

/// Expiry assumed when the token carries no usable `exp` claim (30 minutes).
pub const EXPIRY_FALLBACK_MS: u64 = 30 * 60 * 1000;

/// `exp` values at or below this are seconds since epoch; above, milliseconds.
const SECONDS_THRESHOLD: f64 = 10_000_000_000.0;

/// URL-safe base64 that accepts both padded and unpadded payload segments.
const PAYLOAD_B64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decode the claim set from a compact bearer token.
///
/// Splits on `.`, requires at least a header and payload segment, and
/// base64url-decodes the payload into a JSON object. Returns `None` on any
/// structural, encoding, or parse failure.
pub fn decode_claims(token: &str) -> Option<Map<String, Value>> {
    let mut segments = token.split('.');
    segments.next()?;
    let payload = segments.next()?;
    let bytes = PAYLOAD_B64.decode(payload).ok()?;
    match serde_json::from_slice(&bytes).ok()? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

/// Absolute expiry of `token` in epoch milliseconds.
///
/// Reads the `exp` claim (number, or a string parseable as one). Values at
/// or below 10,000,000,000 are treated as seconds and scaled; larger values
/// are taken as milliseconds. Missing or unusable claims fall back to
/// now + 30 minutes.
pub fn expires_at_ms(token: &str) -> u64 {
    claim_expiry_ms(token).unwrap_or_else(|| epoch_ms() + EXPIRY_FALLBACK_MS)
}

fn claim_expiry_ms(token: &str) -> Option<u64> {
    let claims = decode_claims(token)?;
    let exp = match claims.get("exp")? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !exp.is_finite() {
        return None;
    }
    let ms = if exp <= SECONDS_THRESHOLD { exp * 1000.0 } else { exp };
    Some(ms as u64)
}

/// Whether the token marks its holder as an admin.
///
/// Fail-closed hint only (`false` on absence or decode failure) — the
/// backend remains the authority on every admin-gated call.
pub fn admin_flag(token: &str) -> bool {
    decode_claims(token)
        .and_then(|claims| claims.get("isAdmin").and_then(Value::as_bool))
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "claims_tests.rs"]
mod tests;
