//! Issuer binding check

use crate::error::{ResponderError, ResponderResult};
use crate::ocsp::ParsedRequest;
use crate::pki::CaCertificate;

/// Confirm the request's issuer hashes match the loaded CA
///
/// Both the subject-DN hash and the public-key hash must match under
/// the request's own hash algorithm; a request for any other issuer is
/// rejected before the index is consulted.
pub fn verify_issuer(request: &ParsedRequest, ca: &CaCertificate) -> ResponderResult<()> {
    let alg = request.hash_algorithm;
    if alg.digest(ca.raw_subject()) != request.issuer_name_hash {
        return Err(ResponderError::IssuerMismatch("issuer name hash"));
    }
    if alg.digest(ca.public_key_bits()) != request.issuer_key_hash {
        return Err(ResponderError::IssuerMismatch("issuer key hash"));
    }
    Ok(())
}
