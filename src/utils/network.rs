// Network utilities - Target parsing and DNS resolution

use crate::error::{ResolveError, ResolveResult};
use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::config::*;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use url::{Host, Url};

/// Port used when the input names none
pub const DEFAULT_TLS_PORT: u16 = 443;

/// Target information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub hostname: String,
    pub port: u16,
    pub ip_addresses: Vec<IpAddr>,
}

impl Target {
    /// Parse target from string and resolve its addresses
    ///
    /// Accepts `host`, `host:port`, `[v6]:port`, a bare IP literal, or a URL.
    pub async fn parse(input: &str) -> ResolveResult<Self> {
        let (hostname, port) = parse_host_port(input)?;
        let ip_addresses = resolve_hostname(&hostname).await?;

        Ok(Self {
            hostname,
            port,
            ip_addresses,
        })
    }

    /// Build a target from already known addresses
    pub fn with_addresses(hostname: impl Into<String>, port: u16, ip_addresses: Vec<IpAddr>) -> Self {
        Self {
            hostname: hostname.into(),
            port,
            ip_addresses,
        }
    }

    /// Get all socket addresses
    pub fn socket_addrs(&self) -> Vec<SocketAddr> {
        self.ip_addresses
            .iter()
            .map(|ip| SocketAddr::new(*ip, self.port))
            .collect()
    }

    /// The hostname is an IP literal, so no SNI is sent
    pub fn is_ip_literal(&self) -> bool {
        self.hostname.parse::<IpAddr>().is_ok()
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hostname.contains(':') {
            write!(f, "[{}]:{}", self.hostname, self.port)
        } else {
            write!(f, "{}:{}", self.hostname, self.port)
        }
    }
}

fn invalid(input: &str, reason: impl Into<String>) -> ResolveError {
    ResolveError::InvalidTarget {
        input: input.to_string(),
        reason: reason.into(),
    }
}

/// Split user input into hostname and port without touching the network
pub fn parse_host_port(input: &str) -> ResolveResult<(String, u16)> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(invalid(input, "empty target"));
    }

    if trimmed.contains("://") {
        let url = Url::parse(trimmed).map_err(|e| invalid(input, e.to_string()))?;
        let host = match url.host() {
            Some(Host::Domain(domain)) => domain.to_string(),
            Some(Host::Ipv4(ip)) => ip.to_string(),
            Some(Host::Ipv6(ip)) => ip.to_string(),
            None => return Err(invalid(input, "no hostname in URL")),
        };
        let port = url.port().unwrap_or(DEFAULT_TLS_PORT);
        return Ok((host.to_ascii_lowercase(), port));
    }

    let authority = trimmed.split('/').next().unwrap_or(trimmed);

    let (host, port) = if let Some(rest) = authority.strip_prefix('[') {
        // [v6]:port
        let (host, after) = rest
            .split_once(']')
            .ok_or_else(|| invalid(input, "unterminated IPv6 literal"))?;
        let port = match after {
            "" => DEFAULT_TLS_PORT,
            _ => parse_port(input, after.strip_prefix(':').unwrap_or(after))?,
        };
        (host.to_string(), port)
    } else if authority.matches(':').count() > 1 {
        // Bare IPv6 literal
        (authority.to_string(), DEFAULT_TLS_PORT)
    } else if let Some((host, port_str)) = authority.rsplit_once(':') {
        (host.to_string(), parse_port(input, port_str)?)
    } else {
        (authority.to_string(), DEFAULT_TLS_PORT)
    };

    if host.is_empty() {
        return Err(invalid(input, "missing hostname"));
    }

    Ok((host.trim_end_matches('.').to_ascii_lowercase(), port))
}

fn parse_port(input: &str, port_str: &str) -> ResolveResult<u16> {
    match port_str.parse::<u16>() {
        Ok(0) => Err(invalid(input, "port 0 is not connectable")),
        Ok(port) => Ok(port),
        Err(_) => Err(invalid(input, format!("invalid port '{}'", port_str))),
    }
}

/// Resolve hostname to IP addresses
pub async fn resolve_hostname(hostname: &str) -> ResolveResult<Vec<IpAddr>> {
    // Check if it's already an IP address
    if let Ok(ip) = hostname.parse::<IpAddr>() {
        return Ok(vec![ip]);
    }

    let resolver = TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default());

    let response = resolver
        .lookup_ip(hostname)
        .await
        .map_err(|e| ResolveError::Connection {
            target: hostname.to_string(),
            details: format!("DNS lookup failed: {}", e),
        })?;

    let ips: Vec<IpAddr> = response.iter().collect();

    if ips.is_empty() {
        return Err(ResolveError::Connection {
            target: hostname.to_string(),
            details: "no IP addresses found".to_string(),
        });
    }

    tracing::debug!("Resolved {} to {:?}", hostname, ips);
    Ok(ips)
}
