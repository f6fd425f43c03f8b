//! Integration tests for the listener bootstrap.
//!
//! Covers the plaintext accept loop end-to-end, TLS termination with a
//! generated certificate, and shutdown via the watch channel.

use std::path::PathBuf;
use std::sync::{Arc, Once};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio_rustls::TlsConnector;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};

use fetchbridge_adapter::ConnectionLoop;
use fetchbridge_core::ListenerConfig;
use fetchbridge_event::{EventDispatcher, response};
use fetchbridge_listen::Listener;

static TRACING_INIT: Once = Once::new();

fn init_tracing() {
    TRACING_INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init()
            .ok();
    });
}

fn hello_dispatcher() -> Arc<EventDispatcher> {
    let dispatcher = Arc::new(EventDispatcher::new());
    dispatcher.on_fetch(|event| {
        event.respond_with(response::text_response("hello from the listener"));
    });
    dispatcher
}

fn write_temp(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("fetchbridge-listen-{}-{name}", std::process::id()));
    std::fs::write(&path, contents).unwrap();
    path
}

#[tokio::test]
async fn plaintext_listener_serves_and_shuts_down() {
    init_tracing();

    let config = ListenerConfig::from_flags(Some("http://127.0.0.1:0"), None, None).unwrap();
    let listener = Listener::bind(&config).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let conn_loop = ConnectionLoop::new(config.origin.clone(), hello_dispatcher());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let server = tokio::spawn(listener.run(conn_loop, shutdown_rx));

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET / HTTP/1.1\r\nHost: example\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut reply = Vec::new();
    stream.read_to_end(&mut reply).await.unwrap();
    let reply = String::from_utf8_lossy(&reply);
    assert!(reply.ends_with("hello from the listener"), "got: {reply}");

    shutdown_tx.send(true).unwrap();
    let result = server.await.unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn tls_listener_terminates_and_serves() {
    init_tracing();

    let generated = rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
    let cert_path = write_temp("cert.pem", &generated.cert.pem());
    let key_path = write_temp("key.pem", &generated.key_pair.serialize_pem());

    let config = ListenerConfig::from_flags(
        Some("https://localhost:0"),
        Some(cert_path),
        Some(key_path),
    )
    .unwrap();
    let listener = Listener::bind(&config).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let conn_loop = ConnectionLoop::new(config.origin.clone(), hello_dispatcher());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let server = tokio::spawn(listener.run(conn_loop, shutdown_rx));

    // Client trusting exactly the generated certificate.
    let mut roots = RootCertStore::empty();
    roots.add(generated.cert.der().clone()).unwrap();
    let client_config = ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();
    let connector = TlsConnector::from(Arc::new(client_config));

    let tcp = TcpStream::connect(addr).await.unwrap();
    let server_name = ServerName::try_from("localhost").unwrap();
    let mut stream = connector.connect(server_name, tcp).await.unwrap();

    stream
        .write_all(b"GET /secure HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut reply = Vec::new();
    let _ = stream.read_to_end(&mut reply).await;
    let reply = String::from_utf8_lossy(&reply);
    assert!(reply.contains("hello from the listener"), "got: {reply}");

    shutdown_tx.send(true).unwrap();
    server.await.unwrap().unwrap();
}

#[tokio::test]
async fn tls_handshake_failure_does_not_kill_the_listener() {
    init_tracing();

    let generated = rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
    let cert_path = write_temp("hs-cert.pem", &generated.cert.pem());
    let key_path = write_temp("hs-key.pem", &generated.key_pair.serialize_pem());

    let config = ListenerConfig::from_flags(
        Some("https://localhost:0"),
        Some(cert_path),
        Some(key_path),
    )
    .unwrap();
    let listener = Listener::bind(&config).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let conn_loop = ConnectionLoop::new(config.origin.clone(), hello_dispatcher());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let server = tokio::spawn(listener.run(conn_loop, shutdown_rx));

    // Speak plaintext at a TLS socket; the handshake fails server-side.
    let mut bogus = TcpStream::connect(addr).await.unwrap();
    bogus.write_all(b"definitely not a client hello").await.unwrap();
    let mut discard = Vec::new();
    let _ = bogus.read_to_end(&mut discard).await;
    drop(bogus);

    // The listener must still accept a proper client afterwards.
    let mut roots = RootCertStore::empty();
    roots.add(generated.cert.der().clone()).unwrap();
    let client_config = ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();
    let connector = TlsConnector::from(Arc::new(client_config));

    let tcp = TcpStream::connect(addr).await.unwrap();
    let server_name = ServerName::try_from("localhost").unwrap();
    let mut stream = connector.connect(server_name, tcp).await.unwrap();
    stream
        .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut reply = Vec::new();
    let _ = stream.read_to_end(&mut reply).await;
    assert!(
        String::from_utf8_lossy(&reply).contains("hello from the listener"),
        "listener stopped serving after a failed handshake"
    );

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
}
