// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 StreamGate

//! User account store.
//!
//! ## Table Layout
//!
//! - `users`: user id → serialized UserRecord (JSON bytes)
//! - `users_by_email`: email → user id
//!
//! Passwords are stored as argon2id hashes. Credential verification lives
//! here so the token issuer only ever receives already-authenticated
//! attributes.

use std::path::Path;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};

use crate::auth::Role;

use super::{StoreError, StoreResult};

/// Primary table: user id → serialized UserRecord (JSON bytes).
const USERS: TableDefinition<u64, &[u8]> = TableDefinition::new("users");

/// Index: email → user id.
const USERS_BY_EMAIL: TableDefinition<&str, u64> = TableDefinition::new("users_by_email");

/// A stored user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// argon2id PHC string. Never serialized into API responses.
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    /// Soft-delete marker; deleted accounts cannot authenticate.
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Attributes for a new account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// User store backed by an embedded redb database.
pub struct UserDb {
    db: Database,
}

impl UserDb {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;

        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(USERS)?;
            let _ = write_txn.open_table(USERS_BY_EMAIL)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Create a new account. Fails with `AlreadyExists` if the email is taken.
    pub fn create(&self, new: NewUser) -> StoreResult<UserRecord> {
        let password_hash = hash_password(&new.password)?;

        let write_txn = self.db.begin_write()?;
        let record;
        {
            let mut users = write_txn.open_table(USERS)?;
            let mut by_email = write_txn.open_table(USERS_BY_EMAIL)?;

            if by_email.get(new.email.as_str())?.is_some() {
                return Err(StoreError::AlreadyExists(new.email));
            }

            let id = users.last()?.map(|(key, _)| key.value() + 1).unwrap_or(1);

            record = UserRecord {
                id: id as i64,
                first_name: new.first_name,
                last_name: new.last_name,
                email: new.email,
                password_hash,
                role: new.role,
                created_at: Utc::now(),
                deleted_at: None,
            };
            let json = serde_json::to_vec(&record)?;
            users.insert(id, json.as_slice())?;
            by_email.insert(record.email.as_str(), id)?;
        }
        write_txn.commit()?;
        Ok(record)
    }

    /// Look up an account by id. Soft-deleted accounts are reported absent.
    pub fn find(&self, id: i64) -> StoreResult<Option<UserRecord>> {
        let read_txn = self.db.begin_read()?;
        let users = read_txn.open_table(USERS)?;
        match users.get(id as u64)? {
            Some(value) => {
                let record: UserRecord = serde_json::from_slice(value.value())?;
                Ok(record.deleted_at.is_none().then_some(record))
            }
            None => Ok(None),
        }
    }

    /// Verify credentials. Returns `None` for an unknown email, a
    /// soft-deleted account, or a wrong password; callers answer all three
    /// with the same "invalid credentials" response.
    pub fn authenticate(&self, email: &str, password: &str) -> StoreResult<Option<UserRecord>> {
        let read_txn = self.db.begin_read()?;
        let by_email = read_txn.open_table(USERS_BY_EMAIL)?;
        let Some(id) = by_email.get(email)?.map(|guard| guard.value()) else {
            return Ok(None);
        };
        let users = read_txn.open_table(USERS)?;
        let Some(value) = users.get(id)? else {
            return Ok(None);
        };
        let record: UserRecord = serde_json::from_slice(value.value())?;
        if record.deleted_at.is_some() {
            return Ok(None);
        }
        Ok(verify_password(password, &record.password_hash)?.then_some(record))
    }

    /// Replace an account's password hash. `NotFound` for a missing or
    /// soft-deleted account.
    pub fn set_password(&self, id: i64, new_password: &str) -> StoreResult<()> {
        let password_hash = hash_password(new_password)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut users = write_txn.open_table(USERS)?;
            let mut record: UserRecord = match users.get(id as u64)? {
                Some(value) => serde_json::from_slice(value.value())?,
                None => return Err(StoreError::NotFound(format!("user {id}"))),
            };
            if record.deleted_at.is_some() {
                return Err(StoreError::NotFound(format!("user {id}")));
            }
            record.password_hash = password_hash;
            let json = serde_json::to_vec(&record)?;
            users.insert(id as u64, json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Check a plaintext password against a stored account's hash.
    pub fn check_password(&self, id: i64, password: &str) -> StoreResult<bool> {
        match self.find(id)? {
            Some(record) => verify_password(password, &record.password_hash),
            None => Ok(false),
        }
    }

    /// All live accounts, in id order.
    pub fn list(&self) -> StoreResult<Vec<UserRecord>> {
        let read_txn = self.db.begin_read()?;
        let users = read_txn.open_table(USERS)?;
        let mut records = Vec::new();
        for entry in users.iter()? {
            let (_, value) = entry?;
            let record: UserRecord = serde_json::from_slice(value.value())?;
            if record.deleted_at.is_none() {
                records.push(record);
            }
        }
        Ok(records)
    }
}

fn hash_password(password: &str) -> StoreResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| StoreError::Crypto(e.to_string()))
}

fn verify_password(password: &str, hash: &str) -> StoreResult<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| StoreError::Crypto(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
