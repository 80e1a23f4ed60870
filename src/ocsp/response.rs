//! OCSP response assembly and signing

use bytes::Bytes;
use chrono::{DateTime, Duration, Timelike, Utc};
use num_bigint::BigInt;
use rasn::types::{Any, BitString, GeneralizedTime, OctetString};
use rasn_ocsp::{
    BasicOcspResponse, CertId, CertStatus, OcspResponse, OcspResponseStatus, ResponderId,
    ResponseBytes, ResponseData, RevokedInfo, SingleResponse, Version,
};
use rasn_pkix::{AlgorithmIdentifier, Extension};

use crate::error::{ResponderError, ResponderResult};
use crate::index::RevocationReason;
use crate::ocsp::oid::{self, HashAlgorithm};
use crate::pki::{CaCertificate, ResponderIdentity};

/// Certificate state reported in the single response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertState {
    Good,
    Revoked {
        time: DateTime<Utc>,
        reason: Option<RevocationReason>,
    },
    Unknown,
}

/// Everything needed to assemble one `BasicOCSPResponse`
#[derive(Debug, Clone)]
pub struct ResponseTemplate {
    pub state: CertState,
    pub serial: BigInt,
    /// Hash algorithm used to rebuild the request's `CertID`
    pub hash_algorithm: HashAlgorithm,
    pub produced_at: DateTime<Utc>,
    pub this_update: DateTime<Utc>,
    pub next_update: DateTime<Utc>,
    /// Request nonce, echoed verbatim at response level
    pub nonce: Option<Extension>,
}

impl ResponseTemplate {
    /// Template with the standard validity window around `now`
    ///
    /// `thisUpdate` is backdated a full day: some clients reject
    /// responses whose `thisUpdate` is the epoch or sits in the future
    /// under clock skew.
    pub fn new(
        state: CertState,
        serial: BigInt,
        hash_algorithm: HashAlgorithm,
        nonce: Option<Extension>,
    ) -> Self {
        let now = Utc::now().with_nanosecond(0).unwrap_or_else(Utc::now);
        Self {
            state,
            serial,
            hash_algorithm,
            produced_at: now,
            this_update: now - Duration::days(1),
            next_update: now + Duration::days(1),
            nonce,
        }
    }
}

/// Build and sign a successful `OCSPResponse`
///
/// The `CertID` is rebuilt from the loaded CA certificate rather than
/// echoed from the request, and the responder is identified in `byKey`
/// form (SHA-1 of its public key bits).
pub fn build_response(
    ca: &CaCertificate,
    responder: &ResponderIdentity,
    template: &ResponseTemplate,
) -> ResponderResult<Vec<u8>> {
    let alg = template.hash_algorithm;
    let cert_id = CertId {
        hash_algorithm: AlgorithmIdentifier {
            algorithm: alg.oid().to_owned(),
            // NULL, not absent: OpenSSL-generated requests carry NULL here
            parameters: Some(null_params()?),
        },
        issuer_name_hash: Bytes::from(alg.digest(ca.raw_subject())),
        issuer_key_hash: Bytes::from(alg.digest(ca.public_key_bits())),
        serial_number: template.serial.clone(),
    };

    let cert_status = match &template.state {
        CertState::Good => CertStatus::Good,
        CertState::Revoked { time, reason } => CertStatus::Revoked(RevokedInfo {
            revocation_time: to_generalized(*time),
            revocation_reason: reason.map(RevocationReason::to_crl_reason),
        }),
        CertState::Unknown => CertStatus::Unknown(()),
    };

    let single = SingleResponse {
        cert_id,
        cert_status,
        this_update: to_generalized(template.this_update),
        next_update: Some(to_generalized(template.next_update)),
        single_extensions: None,
    };

    let response_data = ResponseData {
        version: Version::from(0u8),
        responder_id: ResponderId::ByKey(OctetString::copy_from_slice(responder.key_hash())),
        produced_at: to_generalized(template.produced_at),
        responses: vec![single],
        response_extensions: template.nonce.clone().map(|ext| vec![ext].into()),
    };

    let tbs = rasn::der::encode(&response_data)
        .map_err(|e| ResponderError::Internal(format!("tbsResponseData encoding: {e}")))?;
    let signature = responder.signer().sign(&tbs)?;

    let basic = BasicOcspResponse {
        tbs_response_data: response_data,
        signature_algorithm: responder.signer().algorithm_identifier(),
        signature: BitString::from_slice(&signature),
        certs: Some(vec![responder.certificate().clone()]),
    };
    let basic_der = rasn::der::encode(&basic)
        .map_err(|e| ResponderError::Internal(format!("BasicOCSPResponse encoding: {e}")))?;

    let response = OcspResponse {
        status: OcspResponseStatus::Successful,
        bytes: Some(ResponseBytes {
            r#type: oid::OCSP_BASIC.to_owned(),
            response: OctetString::from(basic_der),
        }),
    };
    rasn::der::encode(&response)
        .map_err(|e| ResponderError::Internal(format!("OCSPResponse encoding: {e}")))
}

/// Encode an unsuccessful `OCSPResponse` carrying only a status code
pub fn build_error_response(status: OcspResponseStatus) -> Vec<u8> {
    let response = OcspResponse {
        status,
        bytes: None,
    };
    // A status-only structure; encoding cannot realistically fail
    rasn::der::encode(&response).unwrap_or_default()
}

fn null_params() -> ResponderResult<Any> {
    rasn::der::encode(&())
        .map(Any::new)
        .map_err(|e| ResponderError::Internal(format!("NULL encoding: {e}")))
}

fn to_generalized(time: DateTime<Utc>) -> GeneralizedTime {
    time.fixed_offset()
}
