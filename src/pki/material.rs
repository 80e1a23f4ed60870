//! Certificate and key material, loaded once at startup

use std::path::Path;

use rustls_pemfile::Item;
use sha1::{Digest, Sha1};
use x509_parser::prelude::*;

use crate::error::{ResponderError, ResponderResult};
use crate::pki::signer::ResponderSigner;

/// The CA certificate this responder answers for
///
/// Only the fields the issuer check and `CertID` rebuild need are
/// kept: the raw subject DN and the right-aligned public-key bits.
#[derive(Debug)]
pub struct CaCertificate {
    raw_subject: Vec<u8>,
    public_key_bits: Vec<u8>,
}

impl CaCertificate {
    pub fn load(path: impl AsRef<Path>) -> ResponderResult<Self> {
        let der = read_certificate_der(path.as_ref())?;
        Self::from_der(&der)
    }

    pub fn from_der(der: &[u8]) -> ResponderResult<Self> {
        let (_, cert) = X509Certificate::from_der(der)
            .map_err(|e| ResponderError::Credentials(format!("CA certificate: {e}")))?;
        Ok(Self {
            raw_subject: cert.subject().as_raw().to_vec(),
            public_key_bits: cert.public_key().subject_public_key.data.to_vec(),
        })
    }

    /// DER of the subject `Name`, the input to `issuerNameHash`
    pub fn raw_subject(&self) -> &[u8] {
        &self.raw_subject
    }

    /// Content bytes of the SPKI `BIT STRING`, the input to
    /// `issuerKeyHash`
    pub fn public_key_bits(&self) -> &[u8] {
        &self.public_key_bits
    }
}

/// The responder certificate and signing key
#[derive(Debug)]
pub struct ResponderIdentity {
    certificate: rasn_pkix::Certificate,
    key_hash: Vec<u8>,
    signer: ResponderSigner,
}

impl ResponderIdentity {
    pub fn load(cert_path: impl AsRef<Path>, key_path: impl AsRef<Path>) -> ResponderResult<Self> {
        let cert_der = read_certificate_der(cert_path.as_ref())?;
        let key_der = read_pkcs8_der(key_path.as_ref())?;
        Self::from_der(&cert_der, &key_der)
    }

    pub fn from_der(cert_der: &[u8], key_pkcs8: &[u8]) -> ResponderResult<Self> {
        let certificate: rasn_pkix::Certificate = rasn::der::decode(cert_der)
            .map_err(|e| ResponderError::Credentials(format!("responder certificate: {e}")))?;

        let key_hash = Sha1::digest(
            certificate
                .tbs_certificate
                .subject_public_key_info
                .subject_public_key
                .as_raw_slice(),
        )
        .to_vec();

        Ok(Self {
            certificate,
            key_hash,
            signer: ResponderSigner::from_pkcs8(key_pkcs8)?,
        })
    }

    /// Decoded certificate, embedded in every `BasicOCSPResponse`
    pub fn certificate(&self) -> &rasn_pkix::Certificate {
        &self.certificate
    }

    /// SHA-1 of the public-key bits, the `byKey` responder ID
    pub fn key_hash(&self) -> &[u8] {
        &self.key_hash
    }

    pub fn signer(&self) -> &ResponderSigner {
        &self.signer
    }
}

/// First CERTIFICATE block of a PEM file, as DER
fn read_certificate_der(path: &Path) -> ResponderResult<Vec<u8>> {
    let data = std::fs::read(path)
        .map_err(|e| ResponderError::Credentials(format!("{}: {e}", path.display())))?;
    let cert = rustls_pemfile::certs(&mut data.as_slice())
        .next()
        .ok_or_else(|| {
            ResponderError::Credentials(format!("{}: no certificate found", path.display()))
        })?
        .map_err(|e| ResponderError::Credentials(format!("{}: {e}", path.display())))?;
    Ok(cert.as_ref().to_vec())
}

/// PKCS#8 private-key DER from a PEM file
fn read_pkcs8_der(path: &Path) -> ResponderResult<Vec<u8>> {
    let data = std::fs::read(path)
        .map_err(|e| ResponderError::Credentials(format!("{}: {e}", path.display())))?;
    for item in rustls_pemfile::read_all(&mut data.as_slice()) {
        match item {
            Ok(Item::Pkcs8Key(key)) => return Ok(key.secret_pkcs8_der().to_vec()),
            Ok(_) => continue,
            Err(e) => {
                return Err(ResponderError::Credentials(format!(
                    "{}: {e}",
                    path.display()
                )))
            }
        }
    }
    Err(ResponderError::Credentials(format!(
        "{}: no PKCS#8 private key found",
        path.display()
    )))
}
