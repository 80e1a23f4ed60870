//! HTTP handlers: OCSP endpoints and health check

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use base64::engine::general_purpose::{STANDARD as BASE64_STANDARD, URL_SAFE as BASE64_URL_SAFE};
use base64::Engine;
use chrono::DateTime;

use crate::api::state::AppState;
use crate::error::{IndexError, ResponderError, ResponderResult};
use crate::index::EntryStatus;
use crate::ocsp::{build_response, parse_request, CertState, ResponseTemplate};
use crate::pki::verify_issuer;

pub const OCSP_REQUEST_CONTENT_TYPE: &str = "application/ocsp-request";
pub const OCSP_RESPONSE_CONTENT_TYPE: &str = "application/ocsp-response";

/// `POST /` (and any other method on `/`, which is rejected)
pub async fn ocsp_root(
    State(state): State<Arc<AppState>>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> ResponderResult<Response> {
    if method != Method::POST {
        return Err(ResponderError::MalformedRequest(format!(
            "unsupported request method {method}"
        )));
    }
    respond(&state, &headers, &body).await
}

/// `GET /<base64-encoded request>`
pub async fn ocsp_path(
    State(state): State<Arc<AppState>>,
    method: Method,
    headers: HeaderMap,
    Path(encoded): Path<String>,
) -> ResponderResult<Response> {
    if method != Method::GET {
        return Err(ResponderError::MalformedRequest(format!(
            "unsupported request method {method}"
        )));
    }
    let der = decode_request_path(&encoded)?;
    respond(&state, &headers, &der).await
}

/// `GET /health`
pub async fn health(method: Method) -> StatusCode {
    match method {
        Method::GET => StatusCode::OK,
        _ => StatusCode::BAD_REQUEST,
    }
}

/// Decode the GET path segment; standard base64 first, URL-safe as a
/// compatibility fallback
fn decode_request_path(encoded: &str) -> ResponderResult<Vec<u8>> {
    let encoded = encoded.trim_start_matches('/');
    BASE64_STANDARD
        .decode(encoded)
        .or_else(|_| BASE64_URL_SAFE.decode(encoded))
        .map_err(|e| ResponderError::MalformedRequest(format!("invalid base64 path: {e}")))
}

/// Parse, verify, look up, and answer one OCSP request
async fn respond(
    state: &AppState,
    headers: &HeaderMap,
    der: &[u8],
) -> ResponderResult<Response> {
    if state.strict {
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        if content_type != OCSP_REQUEST_CONTENT_TYPE {
            return Err(ResponderError::MalformedRequest(
                "strict mode requires correct Content-Type header".into(),
            ));
        }
    }

    let request = parse_request(der)?;
    verify_issuer(&request, &state.ca)?;

    tracing::debug!("looking for serial 0x{:x}", request.serial);
    let cert_state = match state.index.lookup(&request.serial).await {
        Ok(entry) => {
            tracing::debug!(
                dn = %entry.distinguished_name,
                status = ?entry.status,
                "found index entry"
            );
            match entry.status {
                EntryStatus::Revoked => CertState::Revoked {
                    time: entry.revocation_time.unwrap_or(DateTime::UNIX_EPOCH),
                    reason: entry.revocation_reason,
                },
                // Expired certificates are reported good; validity is
                // the relying party's check, not the responder's
                EntryStatus::Valid | EntryStatus::Expired => CertState::Good,
            }
        }
        Err(IndexError::NotFound) => {
            tracing::info!("serial 0x{:x} not found in index", request.serial);
            CertState::Unknown
        }
        Err(e) => return Err(e.into()),
    };

    // The replay check must precede response assembly
    if let Some(nonce) = &request.nonce {
        if !state.nonces.check_and_insert(nonce.extn_value.as_ref()) {
            return Err(ResponderError::NonceReplay);
        }
    }

    let template = ResponseTemplate::new(
        cert_state,
        request.serial.clone(),
        request.hash_algorithm,
        request.nonce.clone(),
    );
    let body = build_response(&state.ca, &state.responder, &template)?;
    Ok(([(CONTENT_TYPE, OCSP_RESPONSE_CONTENT_TYPE)], body).into_response())
}
