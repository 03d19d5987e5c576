//! Configuration schema definitions.
//!
//! All types derive Serde traits and default every field, so an empty file
//! is a valid configuration.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct Config {
    /// Settings the application reads per request.
    pub app: AppConfig,

    /// Listener settings for the demo server.
    pub server: ServerConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,
}

/// Application settings, fixed at construction time.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Environment label (e.g. "development", "production").
    pub env: String,

    /// Trust `X-Forwarded-*` headers.
    pub proxy: bool,

    /// Number of trailing host labels that are not subdomains.
    pub subdomain_offset: usize,

    /// Send the error's own message to the client even when it is not exposable.
    pub expose_internal_errors: bool,

    /// Suppress the default error logging.
    pub silent: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            env: "development".to_string(),
            proxy: false,
            subdomain_offset: 2,
            expose_internal_errors: false,
            silent: false,
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:3000").
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3000".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Record request and error metrics.
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
        }
    }
}
