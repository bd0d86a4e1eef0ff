// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 StreamGate

use std::sync::Arc;

use crate::auth::{TokenIssuer, TokenVerifier};
use crate::config::Config;
use crate::storage::{AuditLog, RevocationStore, UserDb};

/// Shared application state, cloned per request.
///
/// Everything in here is immutable after startup except the stores, whose
/// own synchronization (redb transactions, the in-memory mutex) is the only
/// locking in the system.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub issuer: Arc<TokenIssuer>,
    pub verifier: Arc<TokenVerifier>,
    pub revocations: Arc<dyn RevocationStore>,
    pub users: Arc<UserDb>,
    pub audit: Arc<AuditLog>,
}

impl AppState {
    pub fn new(
        config: Config,
        revocations: Arc<dyn RevocationStore>,
        users: UserDb,
        audit: AuditLog,
    ) -> Self {
        let issuer = TokenIssuer::new(&config.jwt_secret, config.token_lifetime);
        let verifier = TokenVerifier::new(
            &config.jwt_secret,
            Arc::clone(&revocations),
            config.store_timeout,
        );
        Self {
            config: Arc::new(config),
            issuer: Arc::new(issuer),
            verifier: Arc::new(verifier),
            revocations,
            users: Arc::new(users),
            audit: Arc::new(audit),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::storage::RevocationDb;
    use std::path::PathBuf;
    use std::time::Duration;
    use tempfile::TempDir;

    /// Build a fully wired state on top of a temp directory.
    pub(crate) fn test_state() -> (AppState, TempDir) {
        let dir = TempDir::new().expect("temp dir");
        let config = Config {
            jwt_secret: "a-test-secret-that-is-long-enough-0123".to_string(),
            token_lifetime: Duration::from_secs(24 * 60 * 60),
            revocation_retention: Duration::from_secs(24 * 60 * 60),
            store_timeout: Duration::from_secs(2),
            prune_interval: Duration::from_secs(3600),
            data_dir: PathBuf::from(dir.path()),
            host: "127.0.0.1".to_string(),
            port: 0,
            seed_admin: None,
        };

        let revocations =
            RevocationDb::open(&dir.path().join("revocations.redb")).expect("revocation db");
        let users = UserDb::open(&dir.path().join("users.redb")).expect("user db");
        let audit = AuditLog::open(dir.path()).expect("audit log");

        let state = AppState::new(config, Arc::new(revocations), users, audit);
        (state, dir)
    }
}
