//! MySQL index backend

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use num_bigint::BigInt;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use sqlx::Row;

use crate::config::DbConfig;
use crate::error::IndexError;
use crate::index::{EntryStatus, IndexEntry, IndexStore, RevocationReason};

/// DDL executed when the probe for `ocsp_index` fails
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS ocsp_index(
    serial BIGINT PRIMARY KEY,
    distinguished_name TEXT,
    valid_from DATETIME DEFAULT CURRENT_TIMESTAMP,
    valid_until DATETIME,
    revoked_status SMALLINT DEFAULT 0,
    revoked_on DATETIME NULL,
    revocation_reason ENUM(
        'UNSPECIFIED',
        'KEYCOMPROMISE',
        'CACOMPROMISE',
        'AFFILIATIONCHANGED',
        'SUPERSEDED',
        'CESSATIONOFOPERATION',
        'CERTIFICATEHOLD',
        'REMOVEFROMCRL',
        'PRIVILEGEWITHDRAWN',
        'AACOMPROMISE'
    ) NULL
)
"#;

/// MySQL-backed index store
pub struct SqlStore {
    pool: MySqlPool,
}

impl SqlStore {
    /// Open a pool from the DSN parts, ping it, and initialize the
    /// schema when the `ocsp_index` probe fails
    ///
    /// A failed ping is fatal to the caller: the responder refuses to
    /// start against an unreachable database.
    pub async fn connect(cfg: &DbConfig) -> Result<Self, IndexError> {
        let mut opts = MySqlConnectOptions::new()
            .username(&cfg.user)
            .database(&cfg.name);
        if !cfg.password.is_empty() {
            opts = opts.password(&cfg.password);
        }
        opts = if cfg.protocol == "unix" {
            opts.socket(&cfg.address)
        } else {
            let (host, port) = split_host_port(&cfg.address);
            opts.host(host).port(port)
        };

        let pool = MySqlPoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await?;
        sqlx::query("SELECT 1").execute(&pool).await?;
        tracing::info!(database = %cfg.name, "connected to index database");

        if sqlx::query("SELECT `serial` FROM `ocsp_index` LIMIT 1")
            .fetch_optional(&pool)
            .await
            .is_err()
        {
            sqlx::query(SCHEMA_SQL).execute(&pool).await?;
            tracing::info!("initialized ocsp_index table");
        }

        Ok(Self { pool })
    }
}

#[async_trait]
impl IndexStore for SqlStore {
    async fn lookup(&self, serial: &BigInt) -> Result<IndexEntry, IndexError> {
        let row = sqlx::query(
            "SELECT `distinguished_name`, `valid_until`, `revoked_status`, `revoked_on`, \
             `revocation_reason` FROM `ocsp_index` WHERE `serial` = ?",
        )
        .bind(serial.to_string())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(IndexError::NotFound)?;

        let distinguished_name: Option<String> = row.try_get("distinguished_name")?;
        let valid_until: Option<NaiveDateTime> = row.try_get("valid_until")?;
        let revoked_status: Option<i16> = row.try_get("revoked_status")?;
        let revoked_on: Option<NaiveDateTime> = row.try_get("revoked_on")?;
        let revocation_reason: Option<String> = row.try_get("revocation_reason")?;

        Ok(entry_from_row(
            serial.clone(),
            distinguished_name,
            valid_until,
            revoked_status.unwrap_or(0),
            revoked_on,
            revocation_reason,
            Utc::now(),
        ))
    }
}

/// Map a fetched row onto an index entry
///
/// A set `revoked_status` wins; otherwise a `revoked_on` timestamp in
/// the past marks the entry `Expired` (the handler still answers
/// `good` for those), and everything else is `Valid`.
fn entry_from_row(
    serial: BigInt,
    distinguished_name: Option<String>,
    valid_until: Option<NaiveDateTime>,
    revoked_status: i16,
    revoked_on: Option<NaiveDateTime>,
    revocation_reason: Option<String>,
    now: DateTime<Utc>,
) -> IndexEntry {
    let revocation_time = revoked_on.map(|naive| naive.and_utc());
    let (status, revocation_reason) = if revoked_status != 0 {
        let reason = revocation_reason
            .as_deref()
            .map(RevocationReason::from_token)
            .unwrap_or(RevocationReason::Unspecified);
        (EntryStatus::Revoked, Some(reason))
    } else if revocation_time.is_some_and(|t| now > t) {
        (EntryStatus::Expired, None)
    } else {
        (EntryStatus::Valid, None)
    };

    IndexEntry {
        serial,
        status,
        expiration: valid_until.map(|naive| naive.and_utc()),
        revocation_time: if status == EntryStatus::Revoked {
            revocation_time
        } else {
            None
        },
        revocation_reason,
        distinguished_name: distinguished_name.unwrap_or_default(),
    }
}

fn split_host_port(address: &str) -> (&str, u16) {
    match address.rsplit_once(':') {
        Some((host, port)) => (host, port.parse().unwrap_or(3306)),
        None => (address, 3306),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn naive(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn revoked_status_wins() {
        let entry = entry_from_row(
            BigInt::from(7),
            Some("/CN=bad".into()),
            Some(naive(2040, 12, 31)),
            1,
            Some(naive(2023, 1, 1)),
            Some("KEYCOMPROMISE".into()),
            Utc::now(),
        );
        assert_eq!(entry.status, EntryStatus::Revoked);
        assert_eq!(
            entry.revocation_reason,
            Some(RevocationReason::KeyCompromise)
        );
        assert_eq!(
            entry.revocation_time.unwrap().to_rfc3339(),
            "2023-01-01T00:00:00+00:00"
        );
    }

    #[test]
    fn revoked_row_without_reason_defaults_to_unspecified() {
        let entry = entry_from_row(
            BigInt::from(7),
            None,
            None,
            1,
            Some(naive(2023, 1, 1)),
            None,
            Utc::now(),
        );
        assert_eq!(entry.status, EntryStatus::Revoked);
        assert_eq!(
            entry.revocation_reason,
            Some(RevocationReason::Unspecified)
        );
    }

    #[test]
    fn past_revoked_on_without_flag_is_expired() {
        let entry = entry_from_row(
            BigInt::from(7),
            None,
            Some(naive(2040, 12, 31)),
            0,
            Some(naive(2020, 1, 1)),
            None,
            Utc::now(),
        );
        assert_eq!(entry.status, EntryStatus::Expired);
        assert!(entry.revocation_time.is_none());
        assert!(entry.revocation_reason.is_none());
    }

    #[test]
    fn plain_row_is_valid() {
        let entry = entry_from_row(
            BigInt::from(7),
            Some("/CN=test".into()),
            Some(naive(2040, 12, 31)),
            0,
            None,
            None,
            Utc::now(),
        );
        assert_eq!(entry.status, EntryStatus::Valid);
        assert_eq!(entry.distinguished_name, "/CN=test");
    }

    #[test]
    fn schema_lists_all_ten_reason_tokens() {
        for token in [
            "UNSPECIFIED",
            "KEYCOMPROMISE",
            "CACOMPROMISE",
            "AFFILIATIONCHANGED",
            "SUPERSEDED",
            "CESSATIONOFOPERATION",
            "CERTIFICATEHOLD",
            "REMOVEFROMCRL",
            "PRIVILEGEWITHDRAWN",
            "AACOMPROMISE",
        ] {
            assert!(SCHEMA_SQL.contains(token), "{token}");
        }
    }

    #[test]
    fn host_port_split() {
        assert_eq!(split_host_port("db.local:3307"), ("db.local", 3307));
        assert_eq!(split_host_port("db.local"), ("db.local", 3306));
        assert_eq!(split_host_port("db.local:bad"), ("db.local", 3306));
    }
}
