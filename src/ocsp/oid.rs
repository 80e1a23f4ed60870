//! Object identifiers and hash algorithm dispatch

use rasn::types::Oid;
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha384, Sha512};

pub const SHA1: &Oid = Oid::const_new(&[1, 3, 14, 3, 2, 26]);
pub const SHA256: &Oid = Oid::const_new(&[2, 16, 840, 1, 101, 3, 4, 2, 1]);
pub const SHA384: &Oid = Oid::const_new(&[2, 16, 840, 1, 101, 3, 4, 2, 2]);
pub const SHA512: &Oid = Oid::const_new(&[2, 16, 840, 1, 101, 3, 4, 2, 3]);

/// id-pkix-ocsp-nonce (RFC 8954)
pub const NONCE: &Oid = Oid::const_new(&[1, 3, 6, 1, 5, 5, 7, 48, 1, 2]);
/// id-pkix-ocsp-basic
pub const OCSP_BASIC: &Oid = Oid::const_new(&[1, 3, 6, 1, 5, 5, 7, 48, 1, 1]);

pub const SHA256_WITH_RSA: &Oid = Oid::const_new(&[1, 2, 840, 113549, 1, 1, 11]);
pub const ECDSA_WITH_SHA256: &Oid = Oid::const_new(&[1, 2, 840, 10045, 4, 3, 2]);
pub const ED25519: &Oid = Oid::const_new(&[1, 3, 101, 112]);

/// Hash algorithms accepted in a request `CertID`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Sha1,
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    /// Map a `CertID.hashAlgorithm` OID; `None` for anything unrecognized
    pub fn from_oid(oid: &Oid) -> Option<Self> {
        if oid == SHA1 {
            Some(Self::Sha1)
        } else if oid == SHA256 {
            Some(Self::Sha256)
        } else if oid == SHA384 {
            Some(Self::Sha384)
        } else if oid == SHA512 {
            Some(Self::Sha512)
        } else {
            None
        }
    }

    pub fn oid(&self) -> &'static Oid {
        match self {
            Self::Sha1 => SHA1,
            Self::Sha256 => SHA256,
            Self::Sha384 => SHA384,
            Self::Sha512 => SHA512,
        }
    }

    /// Digest `data` with this algorithm
    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha1 => Sha1::digest(data).to_vec(),
            Self::Sha256 => Sha256::digest(data).to_vec(),
            Self::Sha384 => Sha384::digest(data).to_vec(),
            Self::Sha512 => Sha512::digest(data).to_vec(),
        }
    }
}
