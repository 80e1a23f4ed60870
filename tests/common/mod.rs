//! Common test fixtures: a throwaway CA + responder chain, app setup,
//! and OCSP request/response helpers

use std::sync::Arc;

use axum::Router;
use bytes::Bytes;
use num_bigint::BigInt;
use rasn::types::{Any, OctetString};
use rasn_ocsp::{
    BasicOcspResponse, CertId, OcspRequest, OcspResponse, OcspResponseStatus, Request, TbsRequest,
    Version,
};
use rasn_pkix::{AlgorithmIdentifier, Extension};
use rcgen::{BasicConstraints, CertificateParams, DnType, IsCa, KeyPair};
use sha2::{Digest, Sha256};
use tempfile::TempDir;

use ocsp_responder::api::{create_router, AppState};
use ocsp_responder::index::FileStore;
use ocsp_responder::ocsp::NonceTracker;
use ocsp_responder::pki::{CaCertificate, ResponderIdentity};

// Re-export frequently used external types for convenience
pub use axum::body::Body;
pub use axum::http::{header, Request as HttpRequest, StatusCode};
pub use tower::ServiceExt;

/// SHA-256 OID as used in request `CertID`s
const SHA256_OID: &[u32] = &[2, 16, 840, 1, 101, 3, 4, 2, 1];
/// id-pkix-ocsp-nonce
const NONCE_OID: &[u32] = &[1, 3, 6, 1, 5, 5, 7, 48, 1, 2];

/// A freshly minted CA with a responder certificate it signed
pub struct TestPki {
    pub ca_der: Vec<u8>,
    pub responder_cert_der: Vec<u8>,
    pub responder_key_pkcs8: Vec<u8>,
}

impl TestPki {
    pub fn new() -> Self {
        let ca_key = KeyPair::generate().expect("generate CA key");
        let mut ca_params = CertificateParams::default();
        ca_params
            .distinguished_name
            .push(DnType::CommonName, "OCSP Test CA");
        ca_params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        let ca_cert = ca_params.self_signed(&ca_key).expect("self-sign CA");

        let responder_key = KeyPair::generate().expect("generate responder key");
        let mut responder_params = CertificateParams::default();
        responder_params
            .distinguished_name
            .push(DnType::CommonName, "OCSP Test Responder");
        let responder_cert = responder_params
            .signed_by(&responder_key, &ca_cert, &ca_key)
            .expect("sign responder cert");

        Self {
            ca_der: ca_cert.der().to_vec(),
            responder_cert_der: responder_cert.der().to_vec(),
            responder_key_pkcs8: responder_key.serialize_der(),
        }
    }

    pub fn ca(&self) -> CaCertificate {
        CaCertificate::from_der(&self.ca_der).expect("parse CA")
    }

    pub fn responder(&self) -> ResponderIdentity {
        ResponderIdentity::from_der(&self.responder_cert_der, &self.responder_key_pkcs8)
            .expect("build responder identity")
    }

    /// SHA-256 of the CA subject DN
    pub fn issuer_name_hash(&self) -> Vec<u8> {
        Sha256::digest(self.ca().raw_subject()).to_vec()
    }

    /// SHA-256 of the CA public-key bits
    pub fn issuer_key_hash(&self) -> Vec<u8> {
        Sha256::digest(self.ca().public_key_bits()).to_vec()
    }
}

/// Build a test app over a file-backed index with the given contents
pub fn test_app(pki: &TestPki, index_content: &str, strict: bool) -> (Router, TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let index_path = dir.path().join("index.txt");
    std::fs::write(&index_path, index_content).expect("write index");

    let state = Arc::new(AppState {
        ca: pki.ca(),
        responder: pki.responder(),
        index: Arc::new(FileStore::new(&index_path)),
        nonces: NonceTracker::default(),
        strict,
    });
    (create_router(state), dir)
}

/// DER-encode an OCSP request for `serial` against the test CA
pub fn build_request(pki: &TestPki, serial: i64, nonce: Option<&[u8]>) -> Vec<u8> {
    build_request_with_hashes(
        pki.issuer_name_hash(),
        pki.issuer_key_hash(),
        serial,
        nonce,
    )
}

/// Same, with caller-controlled issuer hashes (for mismatch scenarios)
pub fn build_request_with_hashes(
    issuer_name_hash: Vec<u8>,
    issuer_key_hash: Vec<u8>,
    serial: i64,
    nonce: Option<&[u8]>,
) -> Vec<u8> {
    let hash_algorithm = AlgorithmIdentifier {
        algorithm: rasn::types::Oid::const_new(SHA256_OID).to_owned(),
        parameters: Some(Any::new(rasn::der::encode(&()).expect("encode NULL"))),
    };

    let request_extensions = nonce.map(|value| {
        vec![Extension {
            extn_id: rasn::types::Oid::const_new(NONCE_OID).to_owned(),
            critical: false,
            extn_value: OctetString::copy_from_slice(value),
        }]
        .into()
    });

    let ocsp_request = OcspRequest {
        tbs_request: TbsRequest {
            version: Version::from(0u8),
            requestor_name: None,
            request_list: vec![Request {
                req_cert: CertId {
                    hash_algorithm,
                    issuer_name_hash: Bytes::from(issuer_name_hash),
                    issuer_key_hash: Bytes::from(issuer_key_hash),
                    serial_number: BigInt::from(serial),
                },
                single_request_extensions: None,
            }],
            request_extensions,
        },
        optional_signature: None,
    };
    rasn::der::encode(&ocsp_request).expect("encode request")
}

/// POST a DER request to the app and return the HTTP response
pub async fn post_request(app: &Router, der: Vec<u8>) -> axum::response::Response {
    app.clone()
        .oneshot(
            HttpRequest::post("/")
                .header(header::CONTENT_TYPE, "application/ocsp-request")
                .body(Body::from(der))
                .expect("build request"),
        )
        .await
        .expect("infallible")
}

pub async fn response_body(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body")
        .to_vec()
}

/// Decode a successful response body down to the `BasicOcspResponse`
pub fn decode_basic_response(body: &[u8]) -> BasicOcspResponse {
    let outer: OcspResponse = rasn::der::decode(body).expect("decode OCSPResponse");
    assert_eq!(outer.status, OcspResponseStatus::Successful);
    let bytes = outer.bytes.expect("responseBytes present");
    rasn::der::decode(&bytes.response).expect("decode BasicOCSPResponse")
}

/// Verify the response signature against the embedded responder cert
/// and check that certificate chains to the test CA
pub fn assert_response_signed(pki: &TestPki, basic: &BasicOcspResponse) {
    use ring::signature::{UnparsedPublicKey, ECDSA_P256_SHA256_ASN1};
    use x509_parser::prelude::*;

    let tbs = rasn::der::encode(&basic.tbs_response_data).expect("encode tbs");
    let certs = basic.certs.as_ref().expect("responder cert embedded");
    let cert_der = rasn::der::encode(&certs[0]).expect("encode cert");

    let (_, responder_cert) = X509Certificate::from_der(&cert_der).expect("parse responder cert");
    let spki_bits = responder_cert
        .public_key()
        .subject_public_key
        .data
        .to_vec();
    UnparsedPublicKey::new(&ECDSA_P256_SHA256_ASN1, &spki_bits)
        .verify(&tbs, basic.signature.as_raw_slice())
        .expect("response signature verifies");

    // Responder certificate chains to the CA
    let (_, ca_cert) = X509Certificate::from_der(&pki.ca_der).expect("parse CA cert");
    responder_cert
        .verify_signature(Some(ca_cert.public_key()))
        .expect("responder cert chains to CA");
}
