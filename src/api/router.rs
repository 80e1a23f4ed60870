//! Router setup and access logging

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request};
use axum::http::header;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::any;
use axum::Router;

use crate::api::handlers;
use crate::api::state::AppState;

/// Create the responder router
///
/// `/health` takes precedence over the wildcard; everything that is
/// neither a POST to `/` nor a GET with a base64 path answers 400
/// inside the handlers.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", any(handlers::health))
        .route("/", any(handlers::ocsp_root))
        .route("/*request", any(handlers::ocsp_path))
        .layer(middleware::from_fn(access_log))
        .with_state(state)
}

/// One access-log line per request
async fn access_log(
    addr: Option<ConnectInfo<SocketAddr>>,
    request: Request,
    next: Next,
) -> Response {
    let headers = request.headers();
    tracing::info!(
        host = header_value(headers, header::HOST),
        remote = %addr.map(|ConnectInfo(a)| a.to_string()).unwrap_or_default(),
        x_forwarded_for = x_forwarded_for(headers),
        method = %request.method(),
        path = %request.uri().path(),
        content_length = header_value(headers, header::CONTENT_LENGTH),
        user_agent = header_value(headers, header::USER_AGENT),
        "request"
    );
    next.run(request).await
}

fn header_value(headers: &axum::http::HeaderMap, name: header::HeaderName) -> String {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn x_forwarded_for(headers: &axum::http::HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
