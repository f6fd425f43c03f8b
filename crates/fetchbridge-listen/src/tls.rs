//! TLS acceptor construction from PEM files.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, bail};
use rustls::ServerConfig;
use tokio_rustls::TlsAcceptor;

/// Build a TLS acceptor from PEM-encoded certificate chain and private key
/// files.
///
/// Any failure here is a startup-time configuration problem; there is no
/// point accepting connections a handshake can never complete.
pub fn load_acceptor(cert_path: &Path, key_path: &Path) -> anyhow::Result<TlsAcceptor> {
    let mut cert_reader = BufReader::new(
        File::open(cert_path)
            .with_context(|| format!("failed to open certificate file {}", cert_path.display()))?,
    );
    let certs = rustls_pemfile::certs(&mut cert_reader)
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("failed to parse certificates in {}", cert_path.display()))?;
    if certs.is_empty() {
        bail!("no certificates found in {}", cert_path.display());
    }

    let mut key_reader = BufReader::new(
        File::open(key_path)
            .with_context(|| format!("failed to open private key file {}", key_path.display()))?,
    );
    let key = rustls_pemfile::private_key(&mut key_reader)
        .with_context(|| format!("failed to parse private key in {}", key_path.display()))?
        .with_context(|| format!("no private key found in {}", key_path.display()))?;

    let config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .context("certificate/key pair rejected")?;

    Ok(TlsAcceptor::from(Arc::new(config)))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("fetchbridge-{}-{name}", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn loads_a_generated_cert_and_key() {
        let generated = rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
        let cert = write_temp("cert.pem", &generated.cert.pem());
        let key = write_temp("key.pem", &generated.key_pair.serialize_pem());

        assert!(load_acceptor(&cert, &key).is_ok());
    }

    #[test]
    fn missing_files_are_reported() {
        let err = match load_acceptor(Path::new("/nonexistent/cert.pem"), Path::new("/nonexistent/key.pem")) {
            Err(e) => e,
            Ok(_) => panic!("expected an error"),
        };
        assert!(err.to_string().contains("certificate file"));
    }

    #[test]
    fn non_pem_content_is_rejected() {
        let cert = write_temp("bogus-cert.pem", "this is not a certificate");
        let key = write_temp("bogus-key.pem", "this is not a key");

        assert!(load_acceptor(&cert, &key).is_err());
    }
}
