//! OCSP request decoding

use num_bigint::BigInt;
use rasn_ocsp::OcspRequest;
use rasn_pkix::Extension;

use crate::error::{ResponderError, ResponderResult};
use crate::ocsp::oid::{self, HashAlgorithm};

/// The fields of a decoded `OCSPRequest` the responder acts on
///
/// Only single-certificate requests are supported; a request list with
/// more than one entry is rejected during parsing.
#[derive(Debug, Clone)]
pub struct ParsedRequest {
    pub hash_algorithm: HashAlgorithm,
    pub issuer_name_hash: Vec<u8>,
    pub issuer_key_hash: Vec<u8>,
    pub serial: BigInt,
    /// Nonce extension, verbatim, when the request carries one
    pub nonce: Option<Extension>,
}

/// Decode a DER `OCSPRequest`
pub fn parse_request(der: &[u8]) -> ResponderResult<ParsedRequest> {
    let request: OcspRequest = rasn::der::decode(der)
        .map_err(|e| ResponderError::MalformedRequest(format!("invalid DER: {e}")))?;

    let tbs = request.tbs_request;
    let single = match tbs.request_list.as_slice() {
        [single] => single,
        other => {
            return Err(ResponderError::MalformedRequest(format!(
                "expected exactly one request entry, got {}",
                other.len()
            )))
        }
    };

    let cert_id = &single.req_cert;
    let hash_algorithm = HashAlgorithm::from_oid(&cert_id.hash_algorithm.algorithm)
        .ok_or_else(|| {
            ResponderError::MalformedRequest(format!(
                "unsupported hash algorithm {:?}",
                cert_id.hash_algorithm.algorithm
            ))
        })?;

    let nonce = tbs
        .request_extensions
        .as_ref()
        .and_then(|exts| exts.iter().find(|ext| ext.extn_id == *oid::NONCE))
        .cloned();

    Ok(ParsedRequest {
        hash_algorithm,
        issuer_name_hash: cert_id.issuer_name_hash.to_vec(),
        issuer_key_hash: cert_id.issuer_key_hash.to_vec(),
        serial: cert_id.serial_number.clone(),
        nonce,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use rasn::types::{Any, OctetString};
    use rasn_ocsp::{CertId, Request, TbsRequest, Version};
    use rasn_pkix::AlgorithmIdentifier;

    fn cert_id(serial: i64) -> CertId {
        CertId {
            hash_algorithm: AlgorithmIdentifier {
                algorithm: oid::SHA256.to_owned(),
                parameters: Some(Any::new(rasn::der::encode(&()).unwrap())),
            },
            issuer_name_hash: Bytes::from(vec![0xaa; 32]),
            issuer_key_hash: Bytes::from(vec![0xbb; 32]),
            serial_number: BigInt::from(serial),
        }
    }

    fn request_der(entries: Vec<Request>, extensions: Option<Vec<Extension>>) -> Vec<u8> {
        let ocsp_request = OcspRequest {
            tbs_request: TbsRequest {
                version: Version::from(0u8),
                requestor_name: None,
                request_list: entries,
                request_extensions: extensions.map(Into::into),
            },
            optional_signature: None,
        };
        rasn::der::encode(&ocsp_request).unwrap()
    }

    #[test]
    fn parses_single_request() {
        let der = request_der(
            vec![Request {
                req_cert: cert_id(0xab),
                single_request_extensions: None,
            }],
            None,
        );

        let parsed = parse_request(&der).unwrap();
        assert_eq!(parsed.hash_algorithm, HashAlgorithm::Sha256);
        assert_eq!(parsed.issuer_name_hash, vec![0xaa; 32]);
        assert_eq!(parsed.issuer_key_hash, vec![0xbb; 32]);
        assert_eq!(parsed.serial, BigInt::from(0xab));
        assert!(parsed.nonce.is_none());
    }

    #[test]
    fn extracts_nonce_extension() {
        let nonce = Extension {
            extn_id: oid::NONCE.to_owned(),
            critical: false,
            extn_value: OctetString::from(vec![1, 2, 3, 4]),
        };
        let der = request_der(
            vec![Request {
                req_cert: cert_id(1),
                single_request_extensions: None,
            }],
            Some(vec![nonce.clone()]),
        );

        let parsed = parse_request(&der).unwrap();
        assert_eq!(parsed.nonce, Some(nonce));
    }

    #[test]
    fn rejects_multiple_requests() {
        let entry = Request {
            req_cert: cert_id(1),
            single_request_extensions: None,
        };
        let der = request_der(vec![entry.clone(), entry], None);

        let err = parse_request(&der).unwrap_err();
        assert!(matches!(err, ResponderError::MalformedRequest(_)));
    }

    #[test]
    fn rejects_empty_request_list() {
        let der = request_der(vec![], None);
        let err = parse_request(&der).unwrap_err();
        assert!(matches!(err, ResponderError::MalformedRequest(_)));
    }

    #[test]
    fn rejects_unknown_hash_algorithm() {
        let mut id = cert_id(1);
        // MD5 is not a recognized CertID hash
        id.hash_algorithm.algorithm =
            rasn::types::Oid::const_new(&[1, 2, 840, 113549, 2, 5]).to_owned();
        let der = request_der(
            vec![Request {
                req_cert: id,
                single_request_extensions: None,
            }],
            None,
        );

        let err = parse_request(&der).unwrap_err();
        assert!(matches!(err, ResponderError::MalformedRequest(_)));
    }

    #[test]
    fn rejects_garbage() {
        let err = parse_request(&[0x30, 0x03, 0x01, 0x01, 0xff]).unwrap_err();
        assert!(matches!(err, ResponderError::MalformedRequest(_)));
    }
}
