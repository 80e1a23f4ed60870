//! HTTP surface of responder errors

use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};

use crate::api::handlers::OCSP_RESPONSE_CONTENT_TYPE;
use crate::error::ResponderError;
use crate::ocsp::build_error_response;

impl IntoResponse for ResponderError {
    /// HTTP 400 carrying a DER `OCSPResponse` with the matching
    /// non-successful status
    fn into_response(self) -> Response {
        tracing::warn!(error = %self, "request failed");
        let body = build_error_response(self.ocsp_status());
        (
            self.status_code(),
            [(CONTENT_TYPE, OCSP_RESPONSE_CONTENT_TYPE)],
            body,
        )
            .into_response()
    }
}
