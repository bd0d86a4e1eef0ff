// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 StreamGate

//! Revocation store: the durable set of revoked token ids.
//!
//! ## Table Layout
//!
//! - `revocations`: jti → serialized RevocationRecord (JSON bytes)
//!
//! ## Contract
//!
//! `revoke` is insert-if-absent with "record exists" as its postcondition:
//! two concurrent revocations of the same jti (a user double-submitting
//! logout from two tabs) both succeed and leave exactly one record. redb
//! serializes write transactions, so the second writer observes the first
//! writer's record and returns without touching the table.
//!
//! A `revoke` that has returned is visible to every subsequent `is_revoked`
//! on the same store; read transactions always see the latest committed
//! state. Records may be pruned once older than the retention window, since
//! by then the token they belong to is already rejected by the expiry check.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};

use super::{StoreError, StoreResult};

/// Primary table: jti → serialized RevocationRecord (JSON bytes).
const REVOCATIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("revocations");

/// One revoked token. Unique per jti.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevocationRecord {
    pub jti: String,
    pub user_id: i64,
    /// Unix seconds at which the revocation was recorded.
    pub revoked_at: i64,
}

/// Durable set of revoked token ids.
///
/// Implementations must make `revoke` idempotent under concurrency and must
/// make a completed `revoke` visible to all subsequent `is_revoked` calls.
pub trait RevocationStore: Send + Sync {
    /// Record `jti` as revoked. Succeeds whether or not a record already
    /// exists; afterwards exactly one record exists.
    fn revoke(&self, jti: &str, user_id: i64) -> StoreResult<()>;

    /// Point lookup: has `jti` been revoked?
    fn is_revoked(&self, jti: &str) -> StoreResult<bool>;

    /// Delete records with `revoked_at` strictly before `cutoff`; returns the
    /// number removed. Storage hygiene only, never required for correctness.
    fn prune_older_than(&self, cutoff: i64) -> StoreResult<usize>;
}

// =============================================================================
// redb-backed store
// =============================================================================

/// Revocation store backed by an embedded redb database.
pub struct RevocationDb {
    db: Database,
}

impl RevocationDb {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;

        // Pre-create the table so read transactions never fail on a fresh db
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(REVOCATIONS)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }
}

impl RevocationStore for RevocationDb {
    fn revoke(&self, jti: &str, user_id: i64) -> StoreResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(REVOCATIONS)?;
            // Write transactions are serialized, so this check-then-insert is
            // atomic with respect to other revokers.
            if table.get(jti)?.is_none() {
                let record = RevocationRecord {
                    jti: jti.to_string(),
                    user_id,
                    revoked_at: Utc::now().timestamp(),
                };
                let json = serde_json::to_vec(&record)?;
                table.insert(jti, json.as_slice())?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    fn is_revoked(&self, jti: &str) -> StoreResult<bool> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(REVOCATIONS)?;
        Ok(table.get(jti)?.is_some())
    }

    fn prune_older_than(&self, cutoff: i64) -> StoreResult<usize> {
        let write_txn = self.db.begin_write()?;
        let removed;
        {
            let mut table = write_txn.open_table(REVOCATIONS)?;
            let mut stale = Vec::new();
            for entry in table.iter()? {
                let (key, value) = entry?;
                let record: RevocationRecord = serde_json::from_slice(value.value())?;
                if record.revoked_at < cutoff {
                    stale.push(key.value().to_string());
                }
            }
            for jti in &stale {
                table.remove(jti.as_str())?;
            }
            removed = stale.len();
        }
        write_txn.commit()?;
        Ok(removed)
    }
}

// =============================================================================
// In-memory fallback
// =============================================================================

/// Mutex-guarded in-memory revocation set.
///
/// One mutex guards both the set and every read of it, which is what gives
/// the same visibility guarantee as the durable store: a `revoke` that has
/// returned happened entirely inside the lock, so any later `is_revoked`
/// acquiring the lock observes it.
#[derive(Default)]
pub struct InMemoryRevocationStore {
    inner: Mutex<HashMap<String, RevocationRecord>>,
}

impl InMemoryRevocationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RevocationStore for InMemoryRevocationStore {
    fn revoke(&self, jti: &str, user_id: i64) -> StoreResult<()> {
        let mut set = self.inner.lock().map_err(poisoned)?;
        set.entry(jti.to_string()).or_insert_with(|| RevocationRecord {
            jti: jti.to_string(),
            user_id,
            revoked_at: Utc::now().timestamp(),
        });
        Ok(())
    }

    fn is_revoked(&self, jti: &str) -> StoreResult<bool> {
        let set = self.inner.lock().map_err(poisoned)?;
        Ok(set.contains_key(jti))
    }

    fn prune_older_than(&self, cutoff: i64) -> StoreResult<usize> {
        let mut set = self.inner.lock().map_err(poisoned)?;
        let before = set.len();
        set.retain(|_, record| record.revoked_at >= cutoff);
        Ok(before - set.len())
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> StoreError {
    StoreError::Internal("revocation mutex poisoned".to_string())
}
