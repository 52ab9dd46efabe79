// Certificate Parser - Normalize PEM/DER input into immutable certificate records

use crate::error::{ResolveError, ResolveResult};
use oid_registry::{OID_PKIX_ACCESS_DESCRIPTOR_CA_ISSUERS, OID_PKIX_AUTHORITY_INFO_ACCESS};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use x509_parser::prelude::*;

const PEM_CERTIFICATE_TAG: &str = "CERTIFICATE";
const PEM_BEGIN_MARKER: &str = "-----BEGIN ";

/// A parsed X.509 certificate
///
/// The DER encoding is the identity of a certificate: the fingerprint is
/// computed over it and PEM output is always re-derived from it, so two
/// inputs that differ only in PEM formatting produce equal records.
#[derive(Debug, Clone)]
pub struct Certificate {
    der: Vec<u8>,
    subject: String,
    issuer: String,
    subject_raw: Vec<u8>,
    issuer_raw: Vec<u8>,
    fingerprint: String,
    ca_issuers: Vec<String>,
    dns_names: Vec<String>,
    not_after: String,
}

impl PartialEq for Certificate {
    fn eq(&self, other: &Self) -> bool {
        self.der == other.der
    }
}

impl Eq for Certificate {}

impl Certificate {
    /// Parse a single certificate from DER bytes
    ///
    /// Bytes after the certificate's outer SEQUENCE are ignored and do not
    /// become part of its identity.
    pub fn from_der(input: &[u8]) -> ResolveResult<Self> {
        let (rem, cert) = X509Certificate::from_der(input)
            .map_err(|e| ResolveError::malformed(format!("DER parse failed: {}", e)))?;
        let der = &input[..input.len() - rem.len()];
        if !rem.is_empty() {
            tracing::debug!("Ignoring {} trailing bytes after DER certificate", rem.len());
        }

        Ok(Self {
            der: der.to_vec(),
            subject: cert.subject().to_string(),
            issuer: cert.issuer().to_string(),
            subject_raw: cert.subject().as_raw().to_vec(),
            issuer_raw: cert.issuer().as_raw().to_vec(),
            fingerprint: calculate_fingerprint_sha256(der),
            ca_issuers: extract_ca_issuers(&cert),
            dns_names: extract_dns_names(&cert),
            not_after: cert.validity().not_after.to_string(),
        })
    }

    /// Parse the first CERTIFICATE block of PEM text
    pub fn from_pem(input: &[u8]) -> ResolveResult<Self> {
        Self::parse_pem_blocks(input)?
            .into_iter()
            .next()
            .ok_or_else(|| ResolveError::malformed("no CERTIFICATE block in PEM input"))
    }

    /// Normalize raw bytes of unknown encoding into a certificate
    ///
    /// PEM is attempted first, then DER.
    pub fn normalize(input: &[u8]) -> ResolveResult<Self> {
        let pem_err = match Self::from_pem(input) {
            Ok(cert) => return Ok(cert),
            Err(e) => e,
        };

        Self::from_der(input).map_err(|der_err| {
            tracing::debug!("PEM interpretation failed: {}", pem_err);
            ResolveError::malformed(format!(
                "input is neither a PEM nor a DER certificate ({} bytes): {}",
                input.len(),
                der_err
            ))
        })
    }

    /// Parse every certificate in a PEM bundle, or a single DER certificate
    ///
    /// Unparsable PEM blocks are skipped with a warning.
    pub fn parse_all(input: &[u8]) -> ResolveResult<Vec<Self>> {
        if !looks_like_pem(input) {
            return Ok(vec![Self::from_der(input)?]);
        }

        Self::parse_pem_blocks(input)
    }

    fn parse_pem_blocks(input: &[u8]) -> ResolveResult<Vec<Self>> {
        let text = std::str::from_utf8(input)
            .map_err(|e| ResolveError::malformed(format!("PEM input is not UTF-8: {}", e)))?;

        if !text.contains(PEM_BEGIN_MARKER) {
            return Err(ResolveError::malformed("no PEM BEGIN marker"));
        }

        // Line-wrap width and stray whitespace must not affect identity
        let cleaned = text.lines().map(str::trim).collect::<Vec<_>>().join("\n");

        let blocks = ::pem::parse_many(cleaned.as_bytes())
            .map_err(|e| ResolveError::malformed(format!("PEM parse failed: {}", e)))?;

        let mut certificates = Vec::new();
        for block in blocks.iter().filter(|b| b.tag() == PEM_CERTIFICATE_TAG) {
            match Self::from_der(block.contents()) {
                Ok(cert) => certificates.push(cert),
                Err(e) => tracing::warn!("Skipping unparsable PEM certificate block: {}", e),
            }
        }

        if certificates.is_empty() {
            return Err(ResolveError::malformed(
                "PEM input contains no parsable CERTIFICATE block",
            ));
        }

        Ok(certificates)
    }

    pub fn der(&self) -> &[u8] {
        &self.der
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Lowercase hex SHA-256 of the DER encoding
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// CA Issuers URIs from the Authority Information Access extension, in extension order
    pub fn ca_issuers(&self) -> &[String] {
        &self.ca_issuers
    }

    /// DNS names from the SAN extension, or the subject CN when there is no SAN
    pub fn dns_names(&self) -> &[String] {
        &self.dns_names
    }

    pub fn not_after(&self) -> &str {
        &self.not_after
    }

    /// Subject and issuer names are byte-identical
    pub fn is_self_signed(&self) -> bool {
        self.subject_raw == self.issuer_raw
    }

    /// Whether `other` names this certificate's issuer as its subject
    pub fn is_issued_by(&self, other: &Certificate) -> bool {
        self.issuer_raw == other.subject_raw
    }

    /// Fingerprint formatted as colon-separated uppercase hex (e.g. "44:69:4E:...")
    pub fn fingerprint_colon(&self) -> String {
        hex::decode(&self.fingerprint)
            .unwrap_or_default()
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect::<Vec<_>>()
            .join(":")
    }

    /// Canonical PEM encoding: 64-column base64, LF line endings
    pub fn to_pem(&self) -> String {
        let block = ::pem::Pem::new(PEM_CERTIFICATE_TAG, self.der.clone());
        ::pem::encode_config(
            &block,
            ::pem::EncodeConfig::new().set_line_ending(::pem::LineEnding::LF),
        )
    }

    /// Check the requested hostname against the certificate's DNS names
    ///
    /// A wildcard covers exactly one left-most label.
    pub fn matches_hostname(&self, hostname: &str) -> bool {
        let hostname = hostname.trim_end_matches('.').to_ascii_lowercase();
        self.dns_names
            .iter()
            .any(|name| dns_name_matches(&name.to_ascii_lowercase(), &hostname))
    }

    pub fn summary(&self) -> CertificateSummary {
        CertificateSummary {
            subject: self.subject.clone(),
            issuer: self.issuer.clone(),
            fingerprint_sha256: self.fingerprint.clone(),
            not_after: self.not_after.clone(),
            self_signed: self.is_self_signed(),
            ca_issuers: self.ca_issuers.clone(),
        }
    }
}

impl fmt::Display for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (sha256 {})", self.subject, &self.fingerprint[..16])
    }
}

/// Serializable view of a certificate used in reports
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CertificateSummary {
    pub subject: String,
    pub issuer: String,
    pub fingerprint_sha256: String,
    pub not_after: String,
    pub self_signed: bool,
    pub ca_issuers: Vec<String>,
}

fn looks_like_pem(input: &[u8]) -> bool {
    input
        .windows(PEM_BEGIN_MARKER.len())
        .any(|w| w == PEM_BEGIN_MARKER.as_bytes())
}

/// SHA-256 over the DER encoding, lowercase hex
pub fn calculate_fingerprint_sha256(der: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(der);
    hex::encode(hasher.finalize())
}

/// Collect every CA Issuers URI (1.3.6.1.5.5.7.48.2) from the AIA extension
///
/// OCSP entries in the same extension are ignored, as are non-URI locations.
fn extract_ca_issuers(cert: &X509Certificate) -> Vec<String> {
    let mut uris = Vec::new();

    if let Ok(Some(ext)) = cert.get_extension_unique(&OID_PKIX_AUTHORITY_INFO_ACCESS)
        && let ParsedExtension::AuthorityInfoAccess(aia) = ext.parsed_extension()
    {
        for access_desc in &aia.accessdescs {
            if access_desc.access_method == OID_PKIX_ACCESS_DESCRIPTOR_CA_ISSUERS
                && let GeneralName::URI(uri) = &access_desc.access_location
            {
                uris.push(uri.to_string());
            }
        }
    }

    uris
}

fn extract_dns_names(cert: &X509Certificate) -> Vec<String> {
    let mut names = Vec::new();

    if let Ok(Some(san)) = cert.subject_alternative_name() {
        for name in &san.value.general_names {
            if let GeneralName::DNSName(dns) = name {
                names.push(dns.to_string());
            }
        }
    }

    if names.is_empty() {
        names.extend(
            cert.subject()
                .iter_common_name()
                .filter_map(|cn| cn.as_str().ok())
                .map(str::to_string),
        );
    }

    names
}

fn dns_name_matches(pattern: &str, hostname: &str) -> bool {
    let pattern = pattern.trim_end_matches('.');

    match pattern.strip_prefix("*.") {
        Some(suffix) => match hostname.split_once('.') {
            Some((label, rest)) => !label.is_empty() && rest == suffix,
            None => false,
        },
        None => pattern == hostname,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::CertFactory;

    #[test]
    fn test_from_der_extracts_names_and_aia() {
        let mut factory = CertFactory::new();
        let root = factory.root("Test Root CA");
        let inter = factory.intermediate("Test Intermediate CA", &root, &["http://ca.test/root.crt"]);

        let cert = Certificate::from_der(&inter.der).unwrap();

        assert!(cert.subject().contains("Test Intermediate CA"));
        assert!(cert.issuer().contains("Test Root CA"));
        assert_eq!(cert.ca_issuers(), ["http://ca.test/root.crt".to_string()]);
        assert!(!cert.is_self_signed());
        assert_eq!(cert.fingerprint().len(), 64);
    }

    #[test]
    fn test_multiple_ca_issuers_keep_extension_order() {
        let mut factory = CertFactory::new();
        let root = factory.root("Order Root");
        let inter = factory.intermediate(
            "Order Intermediate",
            &root,
            &["http://b.test/second.crt", "http://a.test/first.crt"],
        );

        let cert = Certificate::from_der(&inter.der).unwrap();
        assert_eq!(
            cert.ca_issuers(),
            [
                "http://b.test/second.crt".to_string(),
                "http://a.test/first.crt".to_string()
            ]
        );
    }

    #[test]
    fn test_self_signed_detection() {
        let mut factory = CertFactory::new();
        let root = factory.root("Lonely Root");

        let cert = Certificate::from_der(&root.der).unwrap();
        assert!(cert.is_self_signed());
        assert!(cert.ca_issuers().is_empty());
    }

    #[test]
    fn test_normalize_accepts_pem_and_der_identically() {
        let mut factory = CertFactory::new();
        let root = factory.root("Normalize Root");

        let from_der = Certificate::normalize(&root.der).unwrap();
        let from_pem = Certificate::normalize(root.pem.as_bytes()).unwrap();

        assert_eq!(from_der, from_pem);
        assert_eq!(from_der.fingerprint(), from_pem.fingerprint());
    }

    #[test]
    fn test_pem_formatting_does_not_change_identity() {
        let mut factory = CertFactory::new();
        let root = factory.root("Rewrapped Root");
        let canonical = Certificate::from_der(&root.der).unwrap();

        // Re-wrap base64 at 76 columns, add trailing whitespace and CRLF
        let body: String = canonical
            .to_pem()
            .lines()
            .filter(|l| !l.starts_with("-----"))
            .collect();
        let mut rewrapped = String::from("-----BEGIN CERTIFICATE-----  \r\n");
        for chunk in body.as_bytes().chunks(76) {
            rewrapped.push_str(std::str::from_utf8(chunk).unwrap());
            rewrapped.push_str(" \r\n");
        }
        rewrapped.push_str("-----END CERTIFICATE-----\r\n\r\n");

        let reparsed = Certificate::normalize(rewrapped.as_bytes()).unwrap();
        assert_eq!(reparsed.fingerprint(), canonical.fingerprint());
    }

    #[test]
    fn test_trailing_bytes_do_not_change_identity() {
        let mut factory = CertFactory::new();
        let root = factory.root("Padded Root");
        let clean = Certificate::from_der(&root.der).unwrap();

        let mut padded = root.der.clone();
        padded.extend_from_slice(b"\r\n\0\0");
        let cert = Certificate::normalize(&padded).unwrap();

        assert_eq!(cert.der(), root.der.as_slice());
        assert_eq!(cert.fingerprint(), clean.fingerprint());
        assert_eq!(Certificate::from_pem(cert.to_pem().as_bytes()).unwrap(), clean);

        let mut dedup = crate::certificates::dedup::Deduplicator::new();
        assert_eq!(
            dedup.observe(&clean),
            crate::certificates::dedup::Observation::New
        );
        assert_eq!(
            dedup.observe(&cert),
            crate::certificates::dedup::Observation::Duplicate
        );
    }

    #[test]
    fn test_normalize_rejects_garbage() {
        let err = Certificate::normalize(b"definitely not a certificate").unwrap_err();
        assert!(matches!(err, ResolveError::MalformedCertificate { .. }));

        let err = Certificate::normalize(
            b"-----BEGIN CERTIFICATE-----\nAAAA\n-----END CERTIFICATE-----\n",
        )
        .unwrap_err();
        assert!(matches!(err, ResolveError::MalformedCertificate { .. }));
    }

    #[test]
    fn test_parse_all_reads_bundle_in_order() {
        let mut factory = CertFactory::new();
        let root = factory.root("Bundle Root");
        let inter = factory.intermediate("Bundle Intermediate", &root, &[]);
        let bundle = format!("{}\n{}", inter.pem, root.pem);

        let certs = Certificate::parse_all(bundle.as_bytes()).unwrap();
        assert_eq!(certs.len(), 2);
        assert!(certs[0].subject().contains("Bundle Intermediate"));
        assert!(certs[1].subject().contains("Bundle Root"));
        assert!(certs[0].is_issued_by(&certs[1]));
    }

    #[test]
    fn test_to_pem_is_canonical() {
        let mut factory = CertFactory::new();
        let root = factory.root("Canonical Root");
        let cert = Certificate::from_der(&root.der).unwrap();

        let pem = cert.to_pem();
        assert!(pem.starts_with("-----BEGIN CERTIFICATE-----\n"));
        assert!(pem.ends_with("-----END CERTIFICATE-----\n"));
        assert!(!pem.contains('\r'));
        assert!(pem.lines().all(|l| l.len() <= 64));
    }

    #[test]
    fn test_hostname_matching() {
        let mut factory = CertFactory::new();
        let root = factory.root("Host Root");
        let leaf = factory.leaf("www.example.test", &root, &["*.api.example.test"], &[]);
        let cert = Certificate::from_der(&leaf.der).unwrap();

        assert!(cert.matches_hostname("www.example.test"));
        assert!(cert.matches_hostname("WWW.Example.Test."));
        assert!(cert.matches_hostname("v1.api.example.test"));
        assert!(!cert.matches_hostname("a.b.api.example.test"));
        assert!(!cert.matches_hostname("api.example.test"));
        assert!(!cert.matches_hostname("example.test"));
    }

    #[test]
    fn test_fingerprint_is_sha256_hex() {
        let fp = calculate_fingerprint_sha256(b"abc");
        assert_eq!(
            fp,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_fingerprint_colon_format() {
        let mut factory = CertFactory::new();
        let root = factory.root("Colon Root");
        let cert = Certificate::from_der(&root.der).unwrap();

        let colon = cert.fingerprint_colon();
        assert_eq!(colon.len(), 32 * 3 - 1);
        assert_eq!(colon.replace(':', "").to_lowercase(), cert.fingerprint());
    }
}
