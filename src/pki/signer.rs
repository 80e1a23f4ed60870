//! Response signing

use rasn::types::Any;
use rasn_pkix::AlgorithmIdentifier;
use ring::rand::SystemRandom;
use ring::signature::{self, EcdsaKeyPair, Ed25519KeyPair, KeyPair as _, RsaKeyPair};

use crate::error::{ResponderError, ResponderResult};
use crate::ocsp::oid;

/// The responder's signing key
///
/// Constructed once at startup from PKCS#8 DER and shared lock-free
/// across request tasks. The signature algorithm advertised in the
/// response follows the key type.
#[derive(Debug)]
pub enum ResponderSigner {
    Rsa(RsaKeyPair),
    EcdsaP256(EcdsaKeyPair),
    Ed25519(Ed25519KeyPair),
}

impl ResponderSigner {
    /// Probe the key types ring supports, RSA first
    pub fn from_pkcs8(der: &[u8]) -> ResponderResult<Self> {
        if let Ok(key) = RsaKeyPair::from_pkcs8(der) {
            return Ok(Self::Rsa(key));
        }
        let rng = SystemRandom::new();
        if let Ok(key) =
            EcdsaKeyPair::from_pkcs8(&signature::ECDSA_P256_SHA256_ASN1_SIGNING, der, &rng)
        {
            return Ok(Self::EcdsaP256(key));
        }
        if let Ok(key) = Ed25519KeyPair::from_pkcs8_maybe_unchecked(der) {
            return Ok(Self::Ed25519(key));
        }
        Err(ResponderError::Credentials(
            "unsupported responder key type (expected RSA, ECDSA P-256, or Ed25519)".into(),
        ))
    }

    /// Sign `message` (the DER `tbsResponseData`)
    pub fn sign(&self, message: &[u8]) -> ResponderResult<Vec<u8>> {
        let rng = SystemRandom::new();
        match self {
            Self::Rsa(key) => {
                let mut sig = vec![0u8; key.public().modulus_len()];
                key.sign(&signature::RSA_PKCS1_SHA256, &rng, message, &mut sig)
                    .map_err(|_| ResponderError::Internal("RSA signing failed".into()))?;
                Ok(sig)
            }
            Self::EcdsaP256(key) => key
                .sign(&rng, message)
                .map(|sig| sig.as_ref().to_vec())
                .map_err(|_| ResponderError::Internal("ECDSA signing failed".into())),
            Self::Ed25519(key) => Ok(key.sign(message).as_ref().to_vec()),
        }
    }

    /// `signatureAlgorithm` for the `BasicOCSPResponse`
    pub fn algorithm_identifier(&self) -> AlgorithmIdentifier {
        match self {
            // sha256WithRSAEncryption takes an explicit NULL parameter
            Self::Rsa(_) => AlgorithmIdentifier {
                algorithm: oid::SHA256_WITH_RSA.to_owned(),
                parameters: rasn::der::encode(&()).ok().map(Any::new),
            },
            // ecdsa-with-SHA256 and Ed25519 omit parameters (RFC 5758,
            // RFC 8410)
            Self::EcdsaP256(_) => AlgorithmIdentifier {
                algorithm: oid::ECDSA_WITH_SHA256.to_owned(),
                parameters: None,
            },
            Self::Ed25519(_) => AlgorithmIdentifier {
                algorithm: oid::ED25519.to_owned(),
                parameters: None,
            },
        }
    }

    /// Public key bytes, for verification in tests
    pub fn public_key(&self) -> Vec<u8> {
        match self {
            Self::Rsa(key) => key.public_key().as_ref().to_vec(),
            Self::EcdsaP256(key) => key.public_key().as_ref().to_vec(),
            Self::Ed25519(key) => key.public_key().as_ref().to_vec(),
        }
    }
}
