//! fetchbridge-listen — listener bootstrap.
//!
//! Binds the socket named by the configured origin, terminates TLS when
//! the origin selects it, and feeds every accepted connection to a
//! [`ConnectionLoop`]. The accept loop never waits on a connection's
//! requests; each connection is handled on its own task.

pub mod tls;

use std::net::SocketAddr;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio_rustls::TlsAcceptor;
use tracing::{debug, info};

use fetchbridge_adapter::ConnectionLoop;
use fetchbridge_core::{ConfigError, ListenerConfig, Transport};

/// A bound listener, plaintext or TLS-terminating.
pub enum Listener {
    Plain(TcpListener),
    Tls(TcpListener, TlsAcceptor),
}

impl Listener {
    /// Bind according to a validated configuration.
    ///
    /// TLS material is loaded eagerly so that a bad certificate or key
    /// fails startup instead of every handshake.
    pub async fn bind(config: &ListenerConfig) -> anyhow::Result<Self> {
        let host = config.origin.host();
        let port = config.origin.port();
        let listener = TcpListener::bind((host, port))
            .await
            .with_context(|| format!("failed to bind {host}:{port}"))?;

        match (config.origin.transport(), &config.tls) {
            (Transport::Plaintext, _) => Ok(Self::Plain(listener)),
            (Transport::Tls, Some(material)) => {
                let acceptor = tls::load_acceptor(&material.cert, &material.key)?;
                Ok(Self::Tls(listener, acceptor))
            }
            (Transport::Tls, None) => Err(ConfigError::MissingTlsMaterial.into()),
        }
    }

    /// The address actually bound; differs from the configured one when
    /// port 0 was requested.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        match self {
            Self::Plain(listener) | Self::Tls(listener, _) => listener.local_addr(),
        }
    }

    /// Accept connections and hand each to the loop until shutdown flips.
    ///
    /// A failed TLS handshake drops only that connection; accept failures
    /// abort the loop.
    pub async fn run(
        self,
        conn_loop: ConnectionLoop,
        mut shutdown: watch::Receiver<bool>,
    ) -> anyhow::Result<()> {
        let (listener, acceptor) = match self {
            Self::Plain(listener) => (listener, None),
            Self::Tls(listener, acceptor) => (listener, Some(acceptor)),
        };

        info!(
            addr = ?listener.local_addr(),
            tls = acceptor.is_some(),
            "listener accepting connections"
        );

        loop {
            tokio::select! {
                accept_result = listener.accept() => {
                    let (stream, peer) = accept_result.context("accept failed")?;
                    match &acceptor {
                        None => conn_loop.handle_connection(stream, peer),
                        Some(acceptor) => {
                            let acceptor = acceptor.clone();
                            let conn_loop = conn_loop.clone();
                            tokio::spawn(async move {
                                match acceptor.accept(stream).await {
                                    Ok(tls_stream) => conn_loop.handle_connection(tls_stream, peer),
                                    Err(err) => debug!(%peer, error = %err, "TLS handshake failed"),
                                }
                            });
                        }
                    }
                }
                _ = shutdown.changed() => {
                    info!("listener shutting down");
                    break;
                }
            }
        }

        Ok(())
    }
}
