//! fetchbridge-core — origin configuration and error taxonomy.
//!
//! Everything downstream of the listener needs a validated base origin:
//! the adapter resolves request paths against it, and the listener derives
//! its transport (plaintext vs TLS) from it. This crate owns that
//! configuration surface and the startup error types.

pub mod config;
pub mod error;

pub use config::{ListenerConfig, Origin, TlsMaterial, Transport};
pub use error::{ConfigError, ConfigResult};
