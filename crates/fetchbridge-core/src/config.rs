//! Origin and listener configuration.
//!
//! The base origin plays two roles: adapted requests resolve their
//! path-and-query against it to produce absolute URLs, and its scheme and
//! port decide the listener transport. An origin of `https://...`, or any
//! origin on port 443, selects TLS.

use std::path::PathBuf;

use http::Uri;
use http::uri::{Authority, PathAndQuery, Scheme};

use crate::error::{ConfigError, ConfigResult};

/// Conventional secure-HTTP port; selects TLS even for an `http` scheme.
pub const HTTPS_PORT: u16 = 443;

/// Transport selected for the listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Plaintext,
    Tls,
}

/// The validated base origin requests are resolved against.
#[derive(Debug, Clone)]
pub struct Origin {
    scheme: Scheme,
    authority: Authority,
    host: String,
    port: u16,
}

impl Origin {
    /// Parse a base origin from a URL string, e.g. `http://localhost:8080`.
    ///
    /// The scheme must be `http` or `https`; a missing port defaults to the
    /// scheme's conventional one.
    pub fn parse(location: &str) -> ConfigResult<Self> {
        let uri: Uri = location
            .parse()
            .map_err(|e: http::uri::InvalidUri| {
                ConfigError::InvalidOrigin(location.to_string(), e.to_string())
            })?;

        let scheme = uri.scheme().cloned().ok_or_else(|| {
            ConfigError::InvalidOrigin(location.to_string(), "missing scheme".to_string())
        })?;
        if scheme != Scheme::HTTP && scheme != Scheme::HTTPS {
            return Err(ConfigError::UnsupportedScheme(scheme.to_string()));
        }

        let host = uri
            .host()
            .ok_or_else(|| {
                ConfigError::InvalidOrigin(location.to_string(), "missing host".to_string())
            })?
            .to_string();

        let default_port = if scheme == Scheme::HTTPS { HTTPS_PORT } else { 80 };
        let port = uri.port_u16().unwrap_or(default_port);

        let authority: Authority = if port == default_port {
            host.parse()
        } else {
            format!("{host}:{port}").parse()
        }
        .map_err(|e: http::uri::InvalidUri| {
            ConfigError::InvalidOrigin(location.to_string(), e.to_string())
        })?;

        Ok(Self { scheme, authority, host, port })
    }

    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    /// Hostname to bind the listener on.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Port to bind the listener on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Transport implied by this origin.
    pub fn transport(&self) -> Transport {
        if self.scheme == Scheme::HTTPS || self.port == HTTPS_PORT {
            Transport::Tls
        } else {
            Transport::Plaintext
        }
    }

    /// Resolve a request's path-and-query into an absolute URL on this
    /// origin.
    pub fn resolve(&self, path_and_query: &str) -> Uri {
        let pq = path_and_query
            .parse::<PathAndQuery>()
            .unwrap_or_else(|_| PathAndQuery::from_static("/"));
        Uri::builder()
            .scheme(self.scheme.clone())
            .authority(self.authority.clone())
            .path_and_query(pq)
            .build()
            .unwrap_or_default()
    }
}

/// Certificate and key file paths for TLS transport.
#[derive(Debug, Clone)]
pub struct TlsMaterial {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// Fully validated listener configuration.
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    pub origin: Origin,
    pub tls: Option<TlsMaterial>,
}

impl ListenerConfig {
    /// Build from CLI inputs.
    ///
    /// `location` is required; `cert`/`key` are required exactly when the
    /// origin selects TLS and are ignored otherwise.
    pub fn from_flags(
        location: Option<&str>,
        cert: Option<PathBuf>,
        key: Option<PathBuf>,
    ) -> ConfigResult<Self> {
        let origin = Origin::parse(location.ok_or(ConfigError::MissingOrigin)?)?;

        let tls = match origin.transport() {
            Transport::Tls => match (cert, key) {
                (Some(cert), Some(key)) => Some(TlsMaterial { cert, key }),
                _ => return Err(ConfigError::MissingTlsMaterial),
            },
            Transport::Plaintext => None,
        };

        Ok(Self { origin, tls })
    }
}
