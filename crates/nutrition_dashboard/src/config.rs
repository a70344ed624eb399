use std::net::SocketAddr;
use std::time::Duration;

use crate::error::DashboardError;

pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Settings for the HTTP host itself; backend and engine settings live in
/// [`nutrition_engine::config`].
#[derive(Clone, Debug, PartialEq)]
pub struct ServerConfig {
    pub address: SocketAddr,
    pub max_body_size: usize,
    pub request_timeout: Duration,
    pub log_filter: String,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, DashboardError> {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    pub fn from_env_with<F>(mut get: F) -> Result<Self, DashboardError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let address = match get("ADDRESS") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|e| DashboardError::Config(format!("ADDRESS: {e}")))?,
            None => SocketAddr::from(([127, 0, 0, 1], 3000)),
        };
        let max_body_size = match get("MAX_HTTP_BODY_SIZE") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|e| DashboardError::Config(format!("MAX_HTTP_BODY_SIZE: {e}")))?,
            None => DEFAULT_MAX_BODY_SIZE,
        };
        let timeout_secs = match get("NUTRITION_REQUEST_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse().map_err(|e| {
                DashboardError::Config(format!("NUTRITION_REQUEST_TIMEOUT_SECS: {e}"))
            })?,
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
        };
        let log_filter = get("NUTRITION_LOG_LEVEL")
            .or_else(|| get("RUST_LOG"))
            .unwrap_or_else(|| "info".to_string());
        Ok(Self {
            address,
            max_body_size,
            request_timeout: Duration::from_secs(timeout_secs),
            log_filter,
        })
    }
}
