//! Application state shared across HTTP handlers

use std::sync::Arc;

use crate::index::IndexStore;
use crate::ocsp::NonceTracker;
use crate::pki::{CaCertificate, ResponderIdentity};

/// Everything a request needs, built once at startup
///
/// Certificates and the signing key are immutable after load; the
/// index store and nonce tracker handle their own synchronization.
pub struct AppState {
    pub ca: CaCertificate,
    pub responder: ResponderIdentity,
    pub index: Arc<dyn IndexStore>,
    pub nonces: NonceTracker,
    /// Require `Content-Type: application/ocsp-request`
    pub strict: bool,
}
