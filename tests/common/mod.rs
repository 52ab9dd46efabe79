// Shared fixtures for integration tests: generated certificates plus
// local HTTP and TLS servers bound to 127.0.0.1.

#![allow(dead_code)]

#[path = "../../src/test_support.rs"]
mod test_support;

pub use test_support::{CertFactory, TestCert};

use rustls::ServerConfig;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;

/// HTTP server serving fixed bodies by path; unknown paths get a 404
pub struct HttpFixture {
    listener: TcpListener,
    base: String,
    hits: Arc<AtomicUsize>,
}

impl HttpFixture {
    /// Bind first so certificates can embed URIs before the server starts
    pub async fn bind() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        Self {
            listener,
            base,
            hits: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn uri(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }

    /// Start serving; the returned counter tracks handled requests
    pub fn serve(self, routes: HashMap<String, Vec<u8>>) -> Arc<AtomicUsize> {
        let hits = self.hits.clone();
        let listener = self.listener;
        let routes = Arc::new(routes);

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let routes = routes.clone();
                let hits = hits.clone();
                tokio::spawn(async move {
                    let mut buf = vec![0u8; 8192];
                    let n = socket.read(&mut buf).await.unwrap_or(0);
                    let request = String::from_utf8_lossy(&buf[..n]);
                    let path = request
                        .lines()
                        .next()
                        .and_then(|line| line.split_whitespace().nth(1))
                        .unwrap_or("/")
                        .trim_start_matches('/')
                        .to_string();
                    hits.fetch_add(1, Ordering::SeqCst);

                    let (status, body) = match routes.get(&path) {
                        Some(body) => ("200 OK", body.clone()),
                        None => ("404 Not Found", b"not found".to_vec()),
                    };
                    let mut response = format!(
                        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                        status,
                        body.len()
                    )
                    .into_bytes();
                    response.extend_from_slice(&body);

                    let _ = socket.write_all(&response).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        self.hits
    }
}

/// TLS server that presents `chain` (leaf first) signed with `leaf_key`
pub async fn spawn_tls_server(chain: &[&TestCert]) -> SocketAddr {
    let certs: Vec<CertificateDer<'static>> = chain
        .iter()
        .map(|c| CertificateDer::from(c.der.clone()))
        .collect();
    let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(chain[0].key_pkcs8_der()));

    let config = ServerConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()
    .unwrap()
    .with_no_client_auth()
    .with_single_cert(certs, key)
    .unwrap();
    let acceptor = TlsAcceptor::from(Arc::new(config));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let acceptor = acceptor.clone();
            tokio::spawn(async move {
                if let Ok(mut tls) = acceptor.accept(stream).await {
                    let mut buf = [0u8; 64];
                    let _ = tls.read(&mut buf).await;
                }
            });
        }
    });

    addr
}
