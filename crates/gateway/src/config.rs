// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

/// Configuration for the portalgate session gateway.
#[derive(Debug, Clone, clap::Parser)]
pub struct GatewayConfig {
    /// Host to bind on.
    #[arg(long, default_value = "127.0.0.1", env = "PORTALGATE_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 4700, env = "PORTALGATE_PORT")]
    pub port: u16,

    /// Base URL of the portal backend API.
    #[arg(long, default_value = "http://127.0.0.1:8080", env = "PORTALGATE_BACKEND_URL")]
    pub backend_url: String,

    /// Backend request timeout in milliseconds.
    #[arg(long, default_value_t = 10000, env = "PORTALGATE_BACKEND_TIMEOUT_MS")]
    pub backend_timeout_ms: u64,

    /// Issue session cookies without the `Secure` attribute (local dev only).
    #[arg(long, env = "PORTALGATE_INSECURE_COOKIES")]
    pub insecure_cookies: bool,

    /// Session event broadcast channel capacity.
    #[arg(long, default_value_t = 64, env = "PORTALGATE_EVENT_CAPACITY")]
    pub event_capacity: usize,
}

impl GatewayConfig {
    pub fn backend_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.backend_timeout_ms)
    }

    /// Whether session cookies carry the `Secure` attribute.
    pub fn cookies_secure(&self) -> bool {
        !self.insecure_cookies
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
