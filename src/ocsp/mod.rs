//! OCSP wire format (RFC 6960) over the rasn DER codec

pub mod nonce;
pub mod oid;
pub mod request;
pub mod response;

pub use nonce::NonceTracker;
pub use oid::HashAlgorithm;
pub use request::{parse_request, ParsedRequest};
pub use response::{build_error_response, build_response, CertState, ResponseTemplate};
