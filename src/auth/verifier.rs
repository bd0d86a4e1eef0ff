// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 StreamGate

//! Token verification.
//!
//! Verification runs its checks in a fixed order and stops at the first
//! failure, so a caller learns nothing about which later check would also
//! have failed:
//!
//! 1. signature / structure → `InvalidToken`
//! 2. expiry → `TokenExpired`; not-before → `InvalidToken`
//! 3. revocation lookup → `TokenRevoked`
//!
//! This is the only place in the system where a signature is checked; every
//! service past the edge trusts propagated metadata instead (see the
//! `propagation` module).

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

use crate::storage::{run_bounded, RevocationStore};

use super::claims::Claims;
use super::error::AuthError;

/// Validates tokens produced by the issuer sharing the same secret.
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
    revocations: Arc<dyn RevocationStore>,
    store_timeout: Duration,
}

impl TokenVerifier {
    /// Build a verifier from the shared HS256 secret and the revocation
    /// store consulted on every verification.
    pub fn new(
        secret: &str,
        revocations: Arc<dyn RevocationStore>,
        store_timeout: Duration,
    ) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Time bounds are checked explicitly below so expiry and not-before
        // map to their own error kinds in the documented order.
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims = Default::default();

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            revocations,
            store_timeout,
        }
    }

    /// Verify `token` against the current wall clock.
    pub async fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify_at(token, Utc::now().timestamp()).await
    }

    /// Verify `token` against an explicit instant (Unix seconds).
    pub async fn verify_at(&self, token: &str, now: i64) -> Result<Claims, AuthError> {
        // 1. Signature and structure. Any decode failure collapses to
        // InvalidToken; the caller never learns which part was malformed.
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|_| AuthError::InvalidToken)?;
        let claims = data.claims;

        // 2. Time bounds.
        if now > claims.exp {
            return Err(AuthError::TokenExpired);
        }
        if now < claims.nbf {
            return Err(AuthError::InvalidToken);
        }

        // 3. Revocation. The lookup is bounded: a wedged store answers
        // Unavailable rather than stalling the edge.
        let jti = claims.jti.clone();
        let store = Arc::clone(&self.revocations);
        let revoked = run_bounded(self.store_timeout, move || store.is_revoked(&jti)).await?;
        if revoked {
            return Err(AuthError::TokenRevoked);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::issuer::TokenIssuer;
    use crate::auth::roles::Role;
    use crate::storage::{InMemoryRevocationStore, RevocationStore};
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

    const SECRET: &str = "a-test-secret-that-is-long-enough-0123";
    const LIFETIME: Duration = Duration::from_secs(24 * 60 * 60);
    const TIMEOUT: Duration = Duration::from_secs(1);

    fn setup() -> (TokenIssuer, TokenVerifier, Arc<InMemoryRevocationStore>) {
        let revocations = Arc::new(InMemoryRevocationStore::new());
        let issuer = TokenIssuer::new(SECRET, LIFETIME);
        let verifier = TokenVerifier::new(
            SECRET,
            Arc::clone(&revocations) as Arc<dyn RevocationStore>,
            TIMEOUT,
        );
        (issuer, verifier, revocations)
    }

    #[tokio::test]
    async fn issue_then_verify_round_trips_claims() {
        let (issuer, verifier, _) = setup();
        let issued = issuer.issue(7, "user@streamgate.dev", Role::Client).unwrap();

        let claims = verifier.verify(&issued.token).await.unwrap();
        assert_eq!(claims.user_id().unwrap(), 7);
        assert_eq!(claims.email, "user@streamgate.dev");
        assert_eq!(claims.role, Role::Client);
        assert_eq!(claims.jti, issued.jti);
    }

    #[tokio::test]
    async fn verify_succeeds_one_second_before_expiry() {
        let (issuer, verifier, _) = setup();
        let issued = issuer.issue(7, "user@streamgate.dev", Role::Client).unwrap();

        assert!(verifier
            .verify_at(&issued.token, issued.expires_at - 1)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn verify_fails_one_second_after_expiry() {
        let (issuer, verifier, _) = setup();
        let issued = issuer.issue(7, "user@streamgate.dev", Role::Client).unwrap();

        let result = verifier.verify_at(&issued.token, issued.expires_at + 1).await;
        assert!(matches!(result, Err(AuthError::TokenExpired)));
    }

    #[tokio::test]
    async fn token_before_nbf_is_invalid_not_expired() {
        let (issuer, verifier, _) = setup();
        let issued = issuer.issue(7, "user@streamgate.dev", Role::Client).unwrap();

        // One hour before issuance.
        let result = verifier
            .verify_at(&issued.token, issued.expires_at - LIFETIME.as_secs() as i64 - 3600)
            .await;
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[tokio::test]
    async fn revoked_token_is_rejected_before_expiry() {
        let (issuer, verifier, revocations) = setup();
        let issued = issuer.issue(7, "user@streamgate.dev", Role::Client).unwrap();

        revocations.revoke(&issued.jti, 7).unwrap();

        let result = verifier.verify(&issued.token).await;
        assert!(matches!(result, Err(AuthError::TokenRevoked)));
    }

    #[tokio::test]
    async fn expiry_shadows_revocation() {
        // An expired token that is also revoked reports TokenExpired: the
        // checks short-circuit in order and the revocation lookup never runs.
        let (issuer, verifier, revocations) = setup();
        let issued = issuer.issue(7, "user@streamgate.dev", Role::Client).unwrap();
        revocations.revoke(&issued.jti, 7).unwrap();

        let result = verifier.verify_at(&issued.token, issued.expires_at + 1).await;
        assert!(matches!(result, Err(AuthError::TokenExpired)));
    }

    #[tokio::test]
    async fn token_signed_with_other_secret_is_invalid() {
        let (_, verifier, _) = setup();
        let rogue = TokenIssuer::new("a-different-secret-also-long-enough-42", LIFETIME);
        let issued = rogue.issue(7, "user@streamgate.dev", Role::Client).unwrap();

        let result = verifier.verify(&issued.token).await;
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[tokio::test]
    async fn tampered_payload_is_invalid() {
        let (issuer, verifier, _) = setup();
        let issued = issuer.issue(7, "user@streamgate.dev", Role::Client).unwrap();

        // Swap the role claim to admin without re-signing.
        let mut parts: Vec<String> = issued.token.split('.').map(String::from).collect();
        let payload = URL_SAFE_NO_PAD.decode(&parts[1]).unwrap();
        let forged = String::from_utf8(payload)
            .unwrap()
            .replace("\"client\"", "\"admin\"");
        parts[1] = URL_SAFE_NO_PAD.encode(forged.as_bytes());
        let forged_token = parts.join(".");

        let result = verifier.verify(&forged_token).await;
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[tokio::test]
    async fn garbage_is_invalid() {
        let (_, verifier, _) = setup();
        let result = verifier.verify("not-a-token").await;
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }
}
