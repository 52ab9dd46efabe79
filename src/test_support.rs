// Test support - Generate throwaway certificate hierarchies with OpenSSL
//
// Shared by unit tests and, through a #[path] include, by the integration
// tests under tests/. Must not depend on anything in this crate.

#![allow(dead_code)]

use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::ec::{EcGroup, EcKey};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{PKey, Private};
use openssl::x509::extension::{BasicConstraints, SubjectAlternativeName};
use openssl::x509::{X509Builder, X509Extension, X509Name, X509NameBuilder};

/// A generated certificate with its private key
pub struct TestCert {
    pub cn: String,
    pub der: Vec<u8>,
    pub pem: String,
    pub key: PKey<Private>,
}

impl TestCert {
    /// PKCS#8 DER of the private key, as a TLS server needs it
    pub fn key_pkcs8_der(&self) -> Vec<u8> {
        self.key.private_key_to_pkcs8().unwrap()
    }
}

/// Builds certificates with sequential serial numbers
pub struct CertFactory {
    serial: u32,
}

impl CertFactory {
    pub fn new() -> Self {
        Self { serial: 0 }
    }

    /// Self-signed CA certificate
    pub fn root(&mut self, cn: &str) -> TestCert {
        self.build(cn, None, true, &[], &[])
    }

    /// CA certificate signed by `issuer`, with optional AIA CA Issuers URIs
    pub fn intermediate(&mut self, cn: &str, issuer: &TestCert, aia: &[&str]) -> TestCert {
        self.build(cn, Some((&issuer.cn, &issuer.key)), true, &[], aia)
    }

    /// End-entity certificate for `cn` plus `extra_sans`
    pub fn leaf(
        &mut self,
        cn: &str,
        issuer: &TestCert,
        extra_sans: &[&str],
        aia: &[&str],
    ) -> TestCert {
        let mut sans = vec![cn];
        sans.extend_from_slice(extra_sans);
        self.build(cn, Some((&issuer.cn, &issuer.key)), false, &sans, aia)
    }

    /// CA certificate claiming to be issued by `issuer_cn`, signed with its own key
    ///
    /// Signatures are never checked by the resolver, which makes this enough
    /// to build arbitrary AIA graphs, including cycles.
    pub fn named_issuer(&mut self, cn: &str, issuer_cn: &str, aia: &[&str]) -> TestCert {
        let key = new_key();
        self.build_with_key(cn, issuer_cn, &key, key.clone(), true, &[], aia)
    }

    fn build(
        &mut self,
        cn: &str,
        issuer: Option<(&str, &PKey<Private>)>,
        ca: bool,
        sans: &[&str],
        aia: &[&str],
    ) -> TestCert {
        let key = new_key();
        match issuer {
            Some((issuer_cn, signing_key)) => {
                self.build_with_key(cn, issuer_cn, signing_key, key, ca, sans, aia)
            }
            None => self.build_with_key(cn, cn, &key.clone(), key, ca, sans, aia),
        }
    }

    #[allow(deprecated, clippy::too_many_arguments)]
    fn build_with_key(
        &mut self,
        cn: &str,
        issuer_cn: &str,
        signing_key: &PKey<Private>,
        key: PKey<Private>,
        ca: bool,
        sans: &[&str],
        aia: &[&str],
    ) -> TestCert {
        self.serial += 1;

        let mut builder = X509Builder::new().unwrap();
        builder.set_version(2).unwrap();

        let serial = BigNum::from_u32(self.serial)
            .unwrap()
            .to_asn1_integer()
            .unwrap();
        builder.set_serial_number(&serial).unwrap();

        builder.set_subject_name(&name_for(cn)).unwrap();
        builder.set_issuer_name(&name_for(issuer_cn)).unwrap();

        let not_before = Asn1Time::days_from_now(0).unwrap();
        let not_after = Asn1Time::days_from_now(365).unwrap();
        builder.set_not_before(&not_before).unwrap();
        builder.set_not_after(&not_after).unwrap();

        builder.set_pubkey(&key).unwrap();

        if ca {
            let constraints = BasicConstraints::new().critical().ca().build().unwrap();
            builder.append_extension(constraints).unwrap();
        }

        if !sans.is_empty() {
            let mut san = SubjectAlternativeName::new();
            for name in sans {
                san.dns(name);
            }
            let ext = {
                let ctx = builder.x509v3_context(None, None);
                san.build(&ctx).unwrap()
            };
            builder.append_extension(ext).unwrap();
        }

        if !aia.is_empty() {
            let value = aia
                .iter()
                .map(|uri| format!("caIssuers;URI:{}", uri))
                .collect::<Vec<_>>()
                .join(",");
            let ext = {
                let ctx = builder.x509v3_context(None, None);
                X509Extension::new_nid(None, Some(&ctx), Nid::INFO_ACCESS, &value).unwrap()
            };
            builder.append_extension(ext).unwrap();
        }

        builder.sign(signing_key, MessageDigest::sha256()).unwrap();
        let cert = builder.build();

        TestCert {
            cn: cn.to_string(),
            der: cert.to_der().unwrap(),
            pem: String::from_utf8(cert.to_pem().unwrap()).unwrap(),
            key,
        }
    }
}

impl Default for CertFactory {
    fn default() -> Self {
        Self::new()
    }
}

fn new_key() -> PKey<Private> {
    let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
    let ec = EcKey::generate(&group).unwrap();
    PKey::from_ec_key(ec).unwrap()
}

fn name_for(cn: &str) -> X509Name {
    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_text("O", "cabundler tests").unwrap();
    name.append_entry_by_text("CN", cn).unwrap();
    name.build()
}
