// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 StreamGate

//! # Runtime Configuration
//!
//! All configuration is read from the environment exactly once at startup
//! into an immutable [`Config`] that is shared by reference for the lifetime
//! of the process. Nothing re-reads the environment per request.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `JWT_SECRET_KEY` | HS256 signing secret shared by issuer and verifier | Required |
//! | `TOKEN_LIFETIME_MINUTES` | Access token lifetime | `1440` |
//! | `REVOCATION_RETENTION_MINUTES` | How long revocation records are kept | token lifetime |
//! | `STORE_TIMEOUT_MS` | Deadline for a single store operation | `2000` |
//! | `PRUNE_INTERVAL_SECS` | Sweep interval of the revocation pruner | `3600` |
//! | `DATA_DIR` | Directory for the embedded database and audit log | `/data` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |
//! | `SEED_ADMIN_EMAIL` | Email of the admin account seeded at startup | Optional |
//! | `SEED_ADMIN_PASSWORD` | Password of the seeded admin account | Optional |

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Minimum accepted length of the signing secret, in bytes. Anything shorter
/// refuses to start.
const MIN_SECRET_LEN: usize = 32;

/// Default access token lifetime (24 hours).
const DEFAULT_TOKEN_LIFETIME_MINUTES: u64 = 1440;

/// Default per-operation store deadline.
const DEFAULT_STORE_TIMEOUT_MS: u64 = 2000;

/// Default pruner sweep interval.
const DEFAULT_PRUNE_INTERVAL_SECS: u64 = 3600;

/// Errors that abort startup. There is deliberately no fallback secret: a
/// misconfigured signing key is fatal, not a per-request error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("JWT_SECRET_KEY is not set")]
    MissingSecret,

    #[error("JWT_SECRET_KEY must be at least {MIN_SECRET_LEN} bytes")]
    WeakSecret,

    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// Immutable process configuration, constructed once in `main`.
#[derive(Debug, Clone)]
pub struct Config {
    /// HS256 secret shared by the issuer/verifier pair.
    pub jwt_secret: String,
    /// Lifetime of newly issued tokens.
    pub token_lifetime: Duration,
    /// Retention window for revocation records. Never below the token
    /// lifetime, so a revoked-but-unexpired token cannot resurrect.
    pub revocation_retention: Duration,
    /// Deadline applied to every blocking store operation.
    pub store_timeout: Duration,
    /// Interval between revocation prune sweeps.
    pub prune_interval: Duration,
    /// Directory holding the embedded database and the audit log.
    pub data_dir: PathBuf,
    /// Server bind address.
    pub host: String,
    /// Server bind port.
    pub port: u16,
    /// Admin account seeded at startup, if configured.
    pub seed_admin: Option<(String, String)>,
}

impl Config {
    /// Load configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let jwt_secret = env::var("JWT_SECRET_KEY").map_err(|_| ConfigError::MissingSecret)?;
        if jwt_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::WeakSecret);
        }

        let lifetime_minutes = parse_env("TOKEN_LIFETIME_MINUTES", DEFAULT_TOKEN_LIFETIME_MINUTES)?;
        let retention_minutes = parse_env("REVOCATION_RETENTION_MINUTES", lifetime_minutes)?;
        let store_timeout_ms = parse_env("STORE_TIMEOUT_MS", DEFAULT_STORE_TIMEOUT_MS)?;
        let prune_interval_secs = parse_env("PRUNE_INTERVAL_SECS", DEFAULT_PRUNE_INTERVAL_SECS)?;

        let port = match env::var("PORT") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                name: "PORT",
                value: raw,
            })?,
            Err(_) => 8080,
        };

        let seed_admin = match (env::var("SEED_ADMIN_EMAIL"), env::var("SEED_ADMIN_PASSWORD")) {
            (Ok(email), Ok(password)) => Some((email, password)),
            _ => None,
        };

        Ok(Self {
            jwt_secret,
            token_lifetime: Duration::from_secs(lifetime_minutes * 60),
            revocation_retention: Duration::from_secs(
                retention_minutes.max(lifetime_minutes) * 60,
            ),
            store_timeout: Duration::from_millis(store_timeout_ms),
            prune_interval: Duration::from_secs(prune_interval_secs),
            data_dir: env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("/data")),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port,
            seed_admin,
        })
    }
}

fn parse_env(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| ConfigError::InvalidValue { name, value: raw }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_env_uses_default_when_unset() {
        assert_eq!(parse_env("STREAMGATE_TEST_UNSET_VAR", 42).unwrap(), 42);
    }

    #[test]
    fn retention_never_drops_below_lifetime() {
        let lifetime = 1440u64;
        let retention = 10u64;
        assert_eq!(retention.max(lifetime), lifetime);
    }
}
