//! OpenSSL `index.txt` backend with mtime-driven hot reload

use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::time::SystemTime;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use num_bigint::BigInt;

use crate::error::IndexError;
use crate::index::{EntryStatus, IndexEntry, IndexStore, RevocationReason};

/// `YYMMDDhhmmssZ`, the timestamp format OpenSSL writes into the index
const INDEX_TIME_FORMAT: &str = "%y%m%d%H%M%SZ";

/// Entries plus the mtime they were read at
///
/// Readers clone the `Arc` and scan without holding the lock, so a
/// reload never blocks in-flight lookups.
struct Snapshot {
    entries: Arc<Vec<IndexEntry>>,
    modified: Option<SystemTime>,
}

/// File-backed index store
pub struct FileStore {
    path: PathBuf,
    snapshot: RwLock<Snapshot>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            snapshot: RwLock::new(Snapshot {
                entries: Arc::new(Vec::new()),
                modified: None,
            }),
        }
    }

    /// Reload the snapshot when the file's mtime has advanced past the
    /// cached one, then return the current entries
    fn refresh(&self) -> Result<Arc<Vec<IndexEntry>>, IndexError> {
        let modified = std::fs::metadata(&self.path)?.modified()?;

        {
            let snapshot = self.snapshot.read().unwrap_or_else(|e| e.into_inner());
            if snapshot.modified.is_some_and(|cached| modified <= cached) {
                return Ok(snapshot.entries.clone());
            }
        }

        let mut snapshot = self.snapshot.write().unwrap_or_else(|e| e.into_inner());
        // Another task may have reloaded while we waited for the lock
        if snapshot.modified.is_some_and(|cached| modified <= cached) {
            return Ok(snapshot.entries.clone());
        }

        tracing::info!(path = %self.path.display(), "index has changed, reloading");
        let content = std::fs::read_to_string(&self.path)?;
        let entries = Arc::new(parse_index(&content));
        snapshot.entries = entries.clone();
        snapshot.modified = Some(modified);
        Ok(entries)
    }
}

#[async_trait]
impl IndexStore for FileStore {
    async fn lookup(&self, serial: &BigInt) -> Result<IndexEntry, IndexError> {
        let entries = self.refresh()?;
        entries
            .iter()
            .find(|entry| entry.serial == *serial)
            .cloned()
            .ok_or(IndexError::NotFound)
    }
}

/// Parse the tab-delimited index body
///
/// Line format: `status  expiration  revocation_info  serial_hex
/// unused  distinguished_name`. Lines with an unrecognized status
/// letter, too few fields, or an unparsable serial are skipped.
fn parse_index(content: &str) -> Vec<IndexEntry> {
    content.lines().filter_map(parse_line).collect()
}

fn parse_line(line: &str) -> Option<IndexEntry> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < 6 {
        return None;
    }

    let status = match fields[0] {
        "V" => EntryStatus::Valid,
        "R" => EntryStatus::Revoked,
        "E" => EntryStatus::Expired,
        _ => return None,
    };

    let serial = match BigInt::parse_bytes(fields[3].as_bytes(), 16) {
        Some(serial) => serial,
        None => {
            tracing::debug!(line, "skipping index line with unparsable serial");
            return None;
        }
    };

    let (revocation_time, revocation_reason) = if status == EntryStatus::Revoked {
        let (time, reason) = match fields[2].split_once(',') {
            Some((time, reason)) => (time, RevocationReason::from_token(reason)),
            None => (fields[2], RevocationReason::Unspecified),
        };
        (parse_index_time(time), Some(reason))
    } else {
        (None, None)
    };

    Some(IndexEntry {
        serial,
        status,
        expiration: parse_index_time(fields[1]),
        revocation_time,
        revocation_reason,
        distinguished_name: fields[5].to_string(),
    })
}

fn parse_index_time(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, INDEX_TIME_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}
