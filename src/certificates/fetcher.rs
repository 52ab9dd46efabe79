// Issuer Fetcher - Download CA Issuers certificates referenced by AIA extensions

use crate::error::{ResolveError, ResolveResult};
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::timeout;
use url::Url;

/// Default per-fetch timeout
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Default cap on a single AIA response body
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = 1024 * 1024;

/// Source of issuer certificate bytes for an AIA URI
///
/// The resolver only depends on this trait, so the BFS walk can be driven
/// by an in-memory fetcher in tests.
#[async_trait]
pub trait IssuerFetcher: Send + Sync {
    /// Fetch the raw bytes (PEM or DER) behind `uri`
    async fn fetch(&self, uri: &str) -> ResolveResult<Vec<u8>>;
}

/// HTTP(S) fetcher backed by reqwest
pub struct HttpFetcher {
    client: reqwest::Client,
    fetch_timeout: Duration,
    max_response_bytes: usize,
}

impl HttpFetcher {
    /// Create a fetcher with its own client
    pub fn new(fetch_timeout: Duration) -> ResolveResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(fetch_timeout)
            .user_agent(concat!("cabundler/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ResolveError::Config {
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self::with_client(client, fetch_timeout))
    }

    /// Create a fetcher around an existing client
    pub fn with_client(client: reqwest::Client, fetch_timeout: Duration) -> Self {
        Self {
            client,
            fetch_timeout,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
        }
    }

    pub fn with_max_response_bytes(mut self, max_response_bytes: usize) -> Self {
        self.max_response_bytes = max_response_bytes;
        self
    }

    async fn get(&self, uri: &str) -> ResolveResult<Vec<u8>> {
        let mut response = self
            .client
            .get(uri)
            .send()
            .await
            .map_err(|e| ResolveError::fetch(uri, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResolveError::fetch(uri, format!("HTTP {}", status)));
        }

        if let Some(length) = response.content_length()
            && length > self.max_response_bytes as u64
        {
            return Err(ResolveError::fetch(
                uri,
                format!("response of {} bytes exceeds limit", length),
            ));
        }

        // Content-Length is absent on chunked responses; enforce the cap as data arrives
        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| ResolveError::fetch(uri, e.to_string()))?
        {
            if body.len() + chunk.len() > self.max_response_bytes {
                return Err(ResolveError::fetch(
                    uri,
                    format!(
                        "response exceeds limit of {} bytes",
                        self.max_response_bytes
                    ),
                ));
            }
            body.extend_from_slice(&chunk);
        }

        if body.is_empty() {
            return Err(ResolveError::fetch(uri, "empty response body"));
        }

        Ok(body)
    }
}

#[async_trait]
impl IssuerFetcher for HttpFetcher {
    async fn fetch(&self, uri: &str) -> ResolveResult<Vec<u8>> {
        let url = Url::parse(uri).map_err(|e| ResolveError::fetch(uri, e.to_string()))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ResolveError::fetch(
                uri,
                format!("unsupported URI scheme '{}'", url.scheme()),
            ));
        }

        tracing::debug!("Fetching issuer certificate from {}", uri);

        // The client timeout covers the request; this also bounds body streaming
        timeout(self.fetch_timeout, self.get(uri))
            .await
            .map_err(|_| {
                ResolveError::fetch(uri, format!("timed out after {:?}", self.fetch_timeout))
            })?
    }
}
