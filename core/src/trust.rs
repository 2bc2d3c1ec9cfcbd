//! Trusted CA set for server certificate verification.
//!
//! A `TrustStore` is the sole root of trust for an `HttpClient`: the system
//! roots are never consulted. Reading the PEM file is the caller's job.

use std::fmt;

use ureq::tls::{parse_pem, Certificate, PemItem, RootCerts, TlsConfig};
use x509_cert::der::Decode;

use crate::error::ApiError;

/// Immutable set of CA certificates parsed from PEM bytes.
pub struct TrustStore {
    certs: Vec<Certificate<'static>>,
}

impl TrustStore {
    /// Parse every `CERTIFICATE` block in `pem`.
    ///
    /// Blocks whose DER is not an X.509 certificate are skipped, as are
    /// non-certificate items (keys, CRLs).
    /// Fails with `ApiError::CertificateParse` when nothing usable remains.
    pub fn from_pem(pem: &[u8]) -> Result<Self, ApiError> {
        let mut certs = Vec::new();
        let mut skipped = 0usize;

        for item in parse_pem(pem) {
            match item {
                Ok(PemItem::Certificate(cert)) if is_x509(cert.der()) => {
                    certs.push(cert.to_owned());
                }
                _ => skipped += 1,
            }
        }

        if certs.is_empty() {
            return Err(ApiError::CertificateParse(format!(
                "no certificate found in PEM input ({skipped} item(s) skipped)"
            )));
        }

        log::debug!("trust store loaded {} certificate(s), skipped {skipped}", certs.len());
        Ok(Self { certs })
    }

    pub fn len(&self) -> usize {
        self.certs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certs.is_empty()
    }

    /// TLS settings that trust exactly the certificates in this store.
    pub fn tls_config(&self) -> TlsConfig {
        TlsConfig::builder()
            .root_certs(RootCerts::new_with_certs(&self.certs))
            .build()
    }
}

fn is_x509(der: &[u8]) -> bool {
    match x509_cert::Certificate::from_der(der) {
        Ok(_) => true,
        Err(e) => {
            log::debug!("skipping unparseable certificate block: {e}");
            false
        }
    }
}

impl fmt::Debug for TrustStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrustStore")
            .field("certificates", &self.certs.len())
            .finish()
    }
}
