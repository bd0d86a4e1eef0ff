// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 StreamGate

//! Token issuance.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

use super::claims::Claims;
use super::error::AuthError;
use super::roles::Role;

/// A freshly issued token together with the facts callers need about it.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// The signed, opaque token string.
    pub token: String,
    /// Unique id of the token; the key a later revocation uses.
    pub jti: String,
    /// Expiry (Unix seconds).
    pub expires_at: i64,
}

/// Creates signed, time-bounded identity tokens.
///
/// The issuer receives only already-authenticated attributes; checking a
/// password against its hash happens in the user store before this is ever
/// called. Issuance has no side effects beyond constructing the token: no
/// store writes, no events.
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    lifetime: Duration,
    /// Last issuance instant handed out, in nanoseconds. Forced strictly
    /// monotonic so two logins by the same user in the same clock tick still
    /// get distinct jti values.
    last_instant: AtomicI64,
}

impl TokenIssuer {
    /// Build an issuer from the shared HS256 secret and the token lifetime.
    ///
    /// Secret validation (present, long enough) happens at startup in
    /// `Config::from_env`; by the time an issuer exists the secret is good.
    pub fn new(secret: &str, lifetime: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            lifetime,
            last_instant: AtomicI64::new(0),
        }
    }

    /// Issue a token for the given authenticated user attributes.
    ///
    /// Claims: `sub` = user id, `iat` = `nbf` = now,
    /// `exp` = now + lifetime, `jti` = `{user_id}_{issuance_instant_nanos}`.
    pub fn issue(&self, user_id: i64, email: &str, role: Role) -> Result<IssuedToken, AuthError> {
        let now = Utc::now();
        let issued_at = now.timestamp();
        let expires_at = issued_at + self.lifetime.as_secs() as i64;

        let jti = format!("{user_id}_{}", self.next_instant(now));

        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            role,
            jti: jti.clone(),
            iat: issued_at,
            nbf: issued_at,
            exp: expires_at,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("token signing failed: {e}")))?;

        Ok(IssuedToken {
            token,
            jti,
            expires_at,
        })
    }

    /// Next issuance instant in nanoseconds, strictly greater than every
    /// instant previously returned by this issuer.
    fn next_instant(&self, now: chrono::DateTime<Utc>) -> i64 {
        let nanos = now.timestamp_nanos_opt().unwrap_or(i64::MAX - 1);
        let prev = self
            .last_instant
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |prev| {
                Some(nanos.max(prev + 1))
            })
            .unwrap_or(nanos);
        nanos.max(prev + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(
            "a-test-secret-that-is-long-enough-0123",
            Duration::from_secs(24 * 60 * 60),
        )
    }

    #[test]
    fn issued_token_has_three_segments() {
        let issued = issuer().issue(7, "user@streamgate.dev", Role::Client).unwrap();
        assert_eq!(issued.token.split('.').count(), 3);
    }

    #[test]
    fn jti_embeds_user_id() {
        let issued = issuer().issue(7, "user@streamgate.dev", Role::Client).unwrap();
        assert!(issued.jti.starts_with("7_"));
    }

    #[test]
    fn rapid_successive_issuance_yields_distinct_jtis() {
        let issuer = issuer();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..100 {
            let issued = issuer.issue(7, "user@streamgate.dev", Role::Client).unwrap();
            assert!(seen.insert(issued.jti), "jti repeated");
        }
    }

    #[test]
    fn expiry_is_lifetime_from_now() {
        let issuer = TokenIssuer::new(
            "a-test-secret-that-is-long-enough-0123",
            Duration::from_secs(60),
        );
        let before = Utc::now().timestamp();
        let issued = issuer.issue(7, "user@streamgate.dev", Role::Client).unwrap();
        let after = Utc::now().timestamp();

        assert!(issued.expires_at >= before + 60);
        assert!(issued.expires_at <= after + 60);
    }
}
