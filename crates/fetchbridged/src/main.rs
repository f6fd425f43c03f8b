//! fetchbridged — the fetch-event bridge daemon.
//!
//! Binds a listener for the configured origin and dispatches every inbound
//! request as a fetch event. The bare daemon ships a placeholder fetch
//! handler and a logging error handler; embedders register their own
//! handlers on an `EventDispatcher` and reuse the same assembly.
//!
//! # Usage
//!
//! ```text
//! fetchbridged --location http://localhost:8080
//! fetchbridged --location https://example.com:8443 --cert cert.pem --key key.pem
//! ```
//!
//! TLS is selected when the origin's scheme is `https` or its port is 443;
//! `--cert` and `--key` are required in that case.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info};

use fetchbridge_adapter::ConnectionLoop;
use fetchbridge_core::ListenerConfig;
use fetchbridge_event::{EventDispatcher, response};
use fetchbridge_listen::Listener;

#[derive(Parser)]
#[command(name = "fetchbridged", about = "Fetch-event bridge daemon")]
struct Cli {
    /// Base origin requests are resolved against, e.g. http://localhost:8080.
    #[arg(long)]
    location: Option<String>,

    /// PEM certificate chain, required when the origin selects TLS.
    #[arg(long, short = 'c')]
    cert: Option<PathBuf>,

    /// PEM private key, required when the origin selects TLS.
    #[arg(long, short = 'k')]
    key: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    "info,fetchbridged=debug,fetchbridge_adapter=debug,fetchbridge_listen=debug"
                        .parse()
                        .unwrap()
                }),
        )
        .init();

    let cli = Cli::parse();
    let config = ListenerConfig::from_flags(cli.location.as_deref(), cli.cert, cli.key)?;

    let dispatcher = Arc::new(EventDispatcher::new());
    dispatcher.on_fetch(|event| {
        info!(
            method = %event.request().method(),
            uri = %event.request().uri(),
            "fetch event"
        );
        event.respond_with(response::text_response("fetchbridge is running\n"));
    });
    dispatcher.on_error(|event| {
        error!(origin = event.origin, source = %event.source, "{}", event.message);
    });

    let listener = Listener::bind(&config).await?;
    let conn_loop = ConnectionLoop::new(config.origin.clone(), dispatcher);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        }
    });

    listener.run(conn_loop, shutdown_rx).await
}
