// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session data model and lifecycle events.

use serde::{Deserialize, Serialize};

use crate::claims;

/// Identity projected from the backend's who-am-I response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: i64,
    pub email: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// An access/refresh pair as issued by the backend. The two tokens always
/// travel and rotate together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// A fully established session: identity plus the current token pair.
///
/// Either all fields are populated or there is no session at all — partial
/// sessions never exist. `access_token_expires_at_ms` always describes the
/// currently held access token and is recomputed on every rotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub user: SessionUser,
    pub access_token: String,
    pub refresh_token: String,
    pub access_token_expires_at_ms: u64,
    pub can_access_admin: bool,
}

impl SessionRecord {
    /// Assemble a record from an identity and a freshly issued token pair,
    /// deriving expiry and the admin hint from the access token.
    pub fn from_parts(user: SessionUser, tokens: TokenPair) -> Self {
        let access_token_expires_at_ms = claims::expires_at_ms(&tokens.access_token);
        let can_access_admin = claims::admin_flag(&tokens.access_token);
        Self {
            user,
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            access_token_expires_at_ms,
            can_access_admin,
        }
    }
}

/// Events broadcast by the token manager and sign-out coordinator so a UI
/// session mirror can reconcile without polling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Both tokens rotated after a successful refresh.
    Rotated { access_token: String, refresh_token: String },
    /// The session ended; subscribers should surface `message` (if any) and
    /// navigate to `redirect_to`.
    SignedOut { message: Option<String>, redirect_to: String },
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
