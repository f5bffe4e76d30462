// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Error codes for the gateway API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthError {
    InvalidCredentials,
    AccountNotRegistered,
    InvalidToken,
    SessionExpired,
    BadRequest,
    BackendUnavailable,
    Internal,
}

impl AuthError {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidCredentials => 401,
            Self::AccountNotRegistered => 404,
            Self::InvalidToken => 401,
            Self::SessionExpired => 401,
            Self::BadRequest => 400,
            Self::BackendUnavailable => 502,
            Self::Internal => 500,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::AccountNotRegistered => "ACCOUNT_NOT_REGISTERED",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::SessionExpired => "SESSION_EXPIRED",
            Self::BadRequest => "BAD_REQUEST",
            Self::BackendUnavailable => "BACKEND_UNAVAILABLE",
            Self::Internal => "INTERNAL",
        }
    }

    pub fn to_error_body(&self, message: impl Into<String>) -> ErrorBody {
        ErrorBody { code: self.as_str().to_owned(), message: message.into() }
    }

    pub fn to_http_response(
        &self,
        message: impl Into<String>,
    ) -> (StatusCode, Json<ErrorResponse>) {
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorResponse { error: self.to_error_body(message) };
        (status, Json(body))
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level error response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Error body with machine-readable code and human-readable message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
