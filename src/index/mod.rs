//! Revocation index backends
//!
//! The index maps certificate serial numbers to their revocation
//! state. Two backends implement the same lookup: an OpenSSL
//! `index.txt` file that is hot-reloaded when its mtime advances, and
//! a MySQL table initialized on first use.

pub mod file;
pub mod sql;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use num_bigint::BigInt;
use rasn_pkix::CrlReason;

use crate::error::IndexError;

pub use file::FileStore;
pub use sql::SqlStore;

/// Certificate state as recorded in the index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    Valid,
    Revoked,
    /// Past its validity window; the responder still answers `good`
    /// for these
    Expired,
}

/// One certificate's record in the revocation index
///
/// `revocation_time` and `revocation_reason` are meaningful only when
/// `status` is `Revoked`.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub serial: BigInt,
    pub status: EntryStatus,
    pub expiration: Option<DateTime<Utc>>,
    pub revocation_time: Option<DateTime<Utc>>,
    pub revocation_reason: Option<RevocationReason>,
    pub distinguished_name: String,
}

/// RFC 5280 CRL revocation reasons
///
/// Numeric value 7 is unassigned by the RFC, hence the gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevocationReason {
    Unspecified,
    KeyCompromise,
    CaCompromise,
    AffiliationChanged,
    Superseded,
    CessationOfOperation,
    CertificateHold,
    RemoveFromCrl,
    PrivilegeWithdrawn,
    AaCompromise,
}

impl RevocationReason {
    /// Parse an index token (case-insensitive); anything unrecognized
    /// coerces to `Unspecified`
    pub fn from_token(token: &str) -> Self {
        match token.to_ascii_uppercase().as_str() {
            "UNSPECIFIED" => Self::Unspecified,
            "KEYCOMPROMISE" => Self::KeyCompromise,
            "CACOMPROMISE" => Self::CaCompromise,
            "AFFILIATIONCHANGED" => Self::AffiliationChanged,
            "SUPERSEDED" => Self::Superseded,
            "CESSATIONOFOPERATION" => Self::CessationOfOperation,
            "CERTIFICATEHOLD" => Self::CertificateHold,
            "REMOVEFROMCRL" => Self::RemoveFromCrl,
            "PRIVILEGEWITHDRAWN" => Self::PrivilegeWithdrawn,
            "AACOMPROMISE" => Self::AaCompromise,
            _ => Self::Unspecified,
        }
    }

    /// RFC 5280 numeric code
    pub fn code(&self) -> u32 {
        match self {
            Self::Unspecified => 0,
            Self::KeyCompromise => 1,
            Self::CaCompromise => 2,
            Self::AffiliationChanged => 3,
            Self::Superseded => 4,
            Self::CessationOfOperation => 5,
            Self::CertificateHold => 6,
            Self::RemoveFromCrl => 8,
            Self::PrivilegeWithdrawn => 9,
            Self::AaCompromise => 10,
        }
    }

    /// The wire-format enumerated carried in `RevokedInfo`
    pub fn to_crl_reason(self) -> CrlReason {
        match self {
            Self::Unspecified => CrlReason::Unspecified,
            Self::KeyCompromise => CrlReason::KeyCompromise,
            Self::CaCompromise => CrlReason::CaCompromise,
            Self::AffiliationChanged => CrlReason::AffiliationChanged,
            Self::Superseded => CrlReason::Superseded,
            Self::CessationOfOperation => CrlReason::CessationOfOperation,
            Self::CertificateHold => CrlReason::CertificateHold,
            Self::RemoveFromCrl => CrlReason::RemoveFromCRL,
            Self::PrivilegeWithdrawn => CrlReason::PrivilegeWithdrawn,
            Self::AaCompromise => CrlReason::AaCompromise,
        }
    }
}

/// A revocation index backend
///
/// Implementations must be safe for concurrent lookups; the handler
/// shares one store across all request tasks.
#[async_trait]
pub trait IndexStore: Send + Sync {
    /// Fetch the entry for `serial`, `NotFound` when absent
    async fn lookup(&self, serial: &BigInt) -> Result<IndexEntry, IndexError>;
}
