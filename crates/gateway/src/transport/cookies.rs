// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session cookie policy.
//!
//! The http-only cookie pair is the single durable credential store across
//! requests. The two cookies are written and expired together, never
//! independently.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;

use crate::session::TokenPair;

pub const ACCESS_COOKIE: &str = "access_token";
pub const REFRESH_COOKIE: &str = "refresh_token";

/// Cookie lifetime: 7 days.
const MAX_AGE: Duration = Duration::days(7);

fn session_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(MAX_AGE)
        .build()
}

fn expired_cookie(name: &'static str, secure: bool) -> Cookie<'static> {
    Cookie::build((name, String::new()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(Duration::seconds(0))
        .build()
}

/// Write both session cookies from a freshly issued pair.
pub fn store_pair(jar: CookieJar, tokens: &TokenPair, secure: bool) -> CookieJar {
    jar.add(session_cookie(ACCESS_COOKIE, tokens.access_token.clone(), secure))
        .add(session_cookie(REFRESH_COOKIE, tokens.refresh_token.clone(), secure))
}

/// Expire both session cookies.
pub fn clear_pair(jar: CookieJar, secure: bool) -> CookieJar {
    jar.add(expired_cookie(ACCESS_COOKIE, secure)).add(expired_cookie(REFRESH_COOKIE, secure))
}

/// Stored access token, if the cookie is present and non-empty.
pub fn access_token(jar: &CookieJar) -> Option<String> {
    cookie_value(jar, ACCESS_COOKIE)
}

/// Stored refresh token, if the cookie is present and non-empty.
pub fn refresh_token(jar: &CookieJar) -> Option<String> {
    cookie_value(jar, REFRESH_COOKIE)
}

fn cookie_value(jar: &CookieJar, name: &str) -> Option<String> {
    jar.get(name).map(|c| c.value().to_owned()).filter(|v| !v.is_empty())
}
