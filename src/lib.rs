//! RFC 6960 OCSP responder
//!
//! Answers certificate status queries against an OpenSSL `index.txt`
//! file or a MySQL table, signing each response with the responder
//! key. See `api` for the HTTP surface and `ocsp` for the wire codec.

pub mod api;
pub mod config;
pub mod error;
pub mod index;
pub mod ocsp;
pub mod pki;
pub mod server;

// Re-exports
pub use api::{create_router, AppState};
pub use config::{DbConfig, ResponderConfig};
pub use error::{IndexError, ResponderError, ResponderResult};
pub use index::{FileStore, IndexStore, SqlStore};
