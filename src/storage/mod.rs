// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 StreamGate

//! # Storage Module
//!
//! Durable state lives in embedded [redb](https://docs.rs/redb) databases
//! under `DATA_DIR` (pure Rust, ACID):
//!
//! ```text
//! <DATA_DIR>/
//!   revocations.redb   # revoked token ids (the "blacklist")
//!   users.redb         # user accounts and credentials
//!   audit.jsonl        # append-only audit trail
//! ```
//!
//! Store calls are synchronous (redb is an in-process B-tree); request
//! handlers run them through [`run_bounded`], which moves the call onto the
//! blocking pool and enforces the configured deadline so a wedged store
//! surfaces as `Unavailable` instead of hanging the caller.

pub mod audit;
pub mod revocation;
pub mod users;

pub use audit::{AuditEvent, AuditEventType, AuditLog};
pub use revocation::{InMemoryRevocationStore, RevocationDb, RevocationRecord, RevocationStore};
pub use users::{NewUser, UserDb, UserRecord};

use std::time::Duration;

use crate::auth::AuthError;

/// Error type shared by all stores.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("password hashing error: {0}")]
    Crypto(String),

    #[error("internal store error: {0}")]
    Internal(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => AuthError::NotFound,
            StoreError::Serde(e) => AuthError::Internal(e.to_string()),
            StoreError::Crypto(e) | StoreError::Internal(e) => AuthError::Internal(e),
            StoreError::AlreadyExists(what) => {
                AuthError::Internal(format!("unexpected duplicate: {what}"))
            }
            // Everything else is the store misbehaving; callers may retry.
            other => {
                tracing::warn!(error = %other, "store operation failed");
                AuthError::Unavailable
            }
        }
    }
}

/// Run a blocking store operation with a deadline.
///
/// The operation is moved to the blocking pool; if it does not complete
/// within `deadline` the caller gets `Unavailable` and the request future is
/// free to unwind. The orphaned closure finishes (or fails) on the pool and
/// its result is dropped; redb transactions release their locks on drop.
pub async fn run_bounded<T, F>(deadline: Duration, op: F) -> Result<T, AuthError>
where
    T: Send + 'static,
    F: FnOnce() -> StoreResult<T> + Send + 'static,
{
    match tokio::time::timeout(deadline, tokio::task::spawn_blocking(op)).await {
        Err(_) => Err(AuthError::Unavailable),
        Ok(Err(join)) => Err(AuthError::Internal(join.to_string())),
        Ok(Ok(result)) => result.map_err(AuthError::from),
    }
}
