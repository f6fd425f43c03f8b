//! Startup configuration errors.

use thiserror::Error;

/// Errors that can occur while building the listener configuration.
///
/// All of these are fatal at startup; nothing here is recoverable at
/// request time.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no origin configured; pass --location with a base URL")]
    MissingOrigin,

    #[error("invalid origin {0:?}: {1}")]
    InvalidOrigin(String, String),

    #[error("unsupported origin scheme: {0} (expected http or https)")]
    UnsupportedScheme(String),

    #[error("TLS transport requires both --cert and --key")]
    MissingTlsMaterial,
}

pub type ConfigResult<T> = Result<T, ConfigError>;
