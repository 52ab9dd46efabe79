// Chain Capture - TLS handshake that records the certificate chain a server presents

use super::parser::Certificate;
use crate::error::{ResolveError, ResolveResult, ResolveWarning};
use crate::utils::network::Target;
use rustls::ClientConfig;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, IpAddr as PkiIpAddr, ServerName, UnixTime};
use rustls::{DigitallySignedStruct, SignatureScheme};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::TlsConnector;

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Certificates presented by the server, leaf first
#[derive(Debug, Clone)]
pub struct CapturedChain {
    pub certificates: Vec<Certificate>,
    pub warnings: Vec<ResolveWarning>,
    /// Address the handshake completed against
    pub peer: Option<SocketAddr>,
}

impl CapturedChain {
    pub fn leaf(&self) -> Option<&Certificate> {
        self.certificates.first()
    }
}

/// Connects to a target and captures its presented chain
pub struct ChainCapture {
    connect_timeout: Duration,
    handshake_timeout: Duration,
    connector: TlsConnector,
}

impl ChainCapture {
    pub fn new(connect_timeout: Duration, handshake_timeout: Duration) -> ResolveResult<Self> {
        Ok(Self {
            connect_timeout,
            handshake_timeout,
            connector: TlsConnector::from(Arc::new(capture_client_config()?)),
        })
    }

    /// Handshake with each resolved address in turn until one succeeds
    pub async fn capture(&self, target: &Target) -> ResolveResult<CapturedChain> {
        let addrs = target.socket_addrs();
        if addrs.is_empty() {
            return Err(ResolveError::Connection {
                target: target.to_string(),
                details: "no addresses to connect to".to_string(),
            });
        }

        let mut last_error = None;
        for addr in addrs {
            match self.capture_from(target, addr).await {
                Ok(chain) => return Ok(chain),
                Err(e) => {
                    tracing::debug!("Capture from {} failed: {}", addr, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ResolveError::Connection {
            target: target.to_string(),
            details: "all addresses failed".to_string(),
        }))
    }

    async fn capture_from(&self, target: &Target, addr: SocketAddr) -> ResolveResult<CapturedChain> {
        tracing::info!("Connecting to {} ({})", target, addr);

        let stream = timeout(self.connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| ResolveError::ConnectionTimeout {
                target: target.to_string(),
                duration: self.connect_timeout,
            })?
            .map_err(|e| ResolveError::Connection {
                target: target.to_string(),
                details: e.to_string(),
            })?;

        let server_name = server_name_for(target)?;

        let tls_stream = timeout(
            self.handshake_timeout,
            self.connector.connect(server_name, stream),
        )
        .await
        .map_err(|_| ResolveError::ConnectionTimeout {
            target: target.to_string(),
            duration: self.handshake_timeout,
        })?
        .map_err(|e| ResolveError::Connection {
            target: target.to_string(),
            details: format!("TLS handshake failed: {}", e),
        })?;

        let (_, session) = tls_stream.get_ref();
        let presented = session.peer_certificates().unwrap_or_default();
        tracing::debug!("{} presented {} certificate(s)", target, presented.len());

        let mut chain = certificates_from_presented(target, presented)?;
        chain.peer = Some(addr);
        Ok(chain)
    }
}

/// Parse presented DER certificates, skipping the ones that fail
pub fn certificates_from_presented(
    target: &Target,
    presented: &[CertificateDer<'_>],
) -> ResolveResult<CapturedChain> {
    let mut certificates = Vec::with_capacity(presented.len());
    let mut warnings = Vec::new();

    for (position, der) in presented.iter().enumerate() {
        match Certificate::from_der(der.as_ref()) {
            Ok(cert) => certificates.push(cert),
            Err(e) => {
                let source_desc = format!("{} (presented #{})", target, position);
                tracing::warn!("Skipping {}: {}", source_desc, e);
                warnings.push(ResolveWarning::from_error(&e, &source_desc));
            }
        }
    }

    if certificates.is_empty() {
        return Err(ResolveError::NoCertificatesFound {
            target: target.to_string(),
        });
    }

    Ok(CapturedChain {
        certificates,
        warnings,
        peer: None,
    })
}

/// Check the leaf against the requested hostname
pub fn verify_hostname(leaf: &Certificate, hostname: &str) -> ResolveResult<()> {
    if leaf.matches_hostname(hostname) {
        return Ok(());
    }

    Err(ResolveError::HostnameMismatch {
        hostname: hostname.to_string(),
        names: leaf.dns_names().join(", "),
    })
}

fn server_name_for(target: &Target) -> ResolveResult<ServerName<'static>> {
    // IP literals produce ServerName::IpAddress, for which rustls sends no SNI
    if target.is_ip_literal() {
        let ip = target
            .hostname
            .parse::<std::net::IpAddr>()
            .map_err(|e| ResolveError::InvalidTarget {
                input: target.hostname.clone(),
                reason: e.to_string(),
            })?;
        return Ok(ServerName::IpAddress(PkiIpAddr::from(ip)));
    }

    ServerName::try_from(target.hostname.clone()).map_err(|_| ResolveError::InvalidTarget {
        input: target.hostname.clone(),
        reason: "not a valid DNS name".to_string(),
    })
}

fn capture_client_config() -> ResolveResult<ClientConfig> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());

    let config = ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()
        .map_err(|e| ResolveError::Config {
            message: format!("TLS configuration failed: {}", e),
        })?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(AcceptAnyChain::new(provider)))
        .with_no_client_auth();

    Ok(config)
}

/// Certificate verifier that accepts whatever the server presents
///
/// Chains are captured precisely because they may be incomplete, so path
/// validation would reject the inputs this tool exists for. Handshake
/// signatures are still checked so the peer proves key possession.
#[derive(Debug)]
struct AcceptAnyChain {
    provider: Arc<CryptoProvider>,
}

impl AcceptAnyChain {
    fn new(provider: Arc<CryptoProvider>) -> Self {
        Self { provider }
    }
}

impl ServerCertVerifier for AcceptAnyChain {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}
