//! Responder error types

use axum::http::StatusCode;
use rasn_ocsp::OcspResponseStatus;
use thiserror::Error;

/// Main responder error type
///
/// Every variant surfaces as HTTP 400 with a DER-encoded OCSP error
/// response body; `NotFound` from the index never reaches this type
/// because the handler converts it into a signed `unknown` response.
#[derive(Debug, Error)]
pub enum ResponderError {
    /// DER or base64 decoding failure, wrong method, strict-mode
    /// content-type violation, unrecognized hash algorithm
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    /// Request refers to an issuer this responder does not serve
    #[error("issuer mismatch: {0}")]
    IssuerMismatch(&'static str),

    /// Nonce was already seen during this process lifetime
    #[error("nonce has already been used")]
    NonceReplay,

    /// Index backend failure (not a missing serial)
    #[error("index error: {0}")]
    Index(IndexError),

    /// Signing or DER encoding failure
    #[error("internal error: {0}")]
    Internal(String),

    /// Certificate or key material could not be loaded (startup only)
    #[error("credential error: {0}")]
    Credentials(String),
}

/// Index-backend errors
#[derive(Debug, Error)]
pub enum IndexError {
    /// Serial not present in the index
    #[error("serial not present in index")]
    NotFound,

    /// Index file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Database unreachable or query failed
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

/// Responder result type alias
pub type ResponderResult<T> = Result<T, ResponderError>;

impl ResponderError {
    /// HTTP status for this error
    ///
    /// The handler surfaces every failure as 400; kept as a method so
    /// the mapping stays in one place.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    /// The `OCSPResponse.responseStatus` emitted in the error body
    pub fn ocsp_status(&self) -> OcspResponseStatus {
        match self {
            ResponderError::MalformedRequest(_) | ResponderError::NonceReplay => {
                OcspResponseStatus::MalformedRequest
            }
            ResponderError::IssuerMismatch(_) => OcspResponseStatus::Unauthorized,
            ResponderError::Index(_)
            | ResponderError::Internal(_)
            | ResponderError::Credentials(_) => OcspResponseStatus::InternalError,
        }
    }
}

impl From<IndexError> for ResponderError {
    fn from(e: IndexError) -> Self {
        ResponderError::Index(e)
    }
}
