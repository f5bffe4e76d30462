// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use tokio_util::sync::CancellationToken;

use crate::backend::BackendClient;
use crate::config::GatewayConfig;

/// Shared gateway state.
pub struct GatewayState {
    pub config: GatewayConfig,
    pub backend: BackendClient,
    pub shutdown: CancellationToken,
}

impl GatewayState {
    pub fn new(config: GatewayConfig, shutdown: CancellationToken) -> Self {
        let backend = BackendClient::new(config.backend_url.clone(), config.backend_timeout());
        Self { config, backend, shutdown }
    }
}

/// Return current epoch millis.
pub fn epoch_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
