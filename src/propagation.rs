// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 StreamGate

//! # Trust Propagation
//!
//! Once the edge has verified a bearer token, internal services never see it
//! again. Identity travels onward as three metadata headers attached to each
//! internal call:
//!
//! | Header | Content |
//! |--------|---------|
//! | `x-user-id` | user id as an integer string |
//! | `x-user-role` | `admin` or `client` |
//! | `x-token-id` | the token's jti, for services that check revocation |
//!
//! ## Trust boundary (design invariant)
//!
//! [`TrustedIdentity`] is deliberately a different type from the verifier's
//! `Claims`: it asserts that *the edge* verified a signature, not that the
//! holder did. Internal services reconstruct it from metadata alone and
//! perform **no signature verification**. The edge is the single
//! verification point, and the network segment between edge and internal
//! services is assumed closed and trusted. Code that needs a
//! cryptographically checked token must use `TokenVerifier`; it cannot get
//! one from a `TrustedIdentity`.
//!
//! The edge strips these headers from every inbound external request before
//! doing anything else, so a caller on the outside cannot forge them.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, HeaderValue},
};

use crate::auth::{AuthError, Claims, Role};

/// Metadata header carrying the user id (integer string).
pub const USER_ID_HEADER: &str = "x-user-id";

/// Metadata header carrying the role.
pub const ROLE_HEADER: &str = "x-user-role";

/// Metadata header carrying the token id (optional downstream).
pub const TOKEN_ID_HEADER: &str = "x-token-id";

/// Identity accepted on faith from call metadata.
///
/// Valid only for the call that constructed it; never cached, never
/// persisted, reconstructed fresh on every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedIdentity {
    pub user_id: i64,
    pub role: Role,
    /// Present when the edge forwarded the token id; services that revoke
    /// (logout) need it, most others ignore it.
    pub jti: Option<String>,
}

impl TrustedIdentity {
    /// Build the propagated identity from claims the edge just verified.
    pub fn from_verified(claims: &Claims) -> Result<Self, AuthError> {
        Ok(Self {
            user_id: claims.user_id()?,
            role: claims.role,
            jti: Some(claims.jti.clone()),
        })
    }

    /// Attach this identity to an outbound internal call.
    pub fn inject(&self, headers: &mut HeaderMap) -> Result<(), AuthError> {
        let user_id = HeaderValue::from_str(&self.user_id.to_string())
            .map_err(|e| AuthError::Internal(format!("user id header: {e}")))?;
        headers.insert(USER_ID_HEADER, user_id);
        headers.insert(ROLE_HEADER, HeaderValue::from_static(self.role.as_str()));
        if let Some(jti) = &self.jti {
            let jti = HeaderValue::from_str(jti)
                .map_err(|e| AuthError::Internal(format!("token id header: {e}")))?;
            headers.insert(TOKEN_ID_HEADER, jti);
        }
        Ok(())
    }

    /// Reconstruct the identity on the receiving side.
    ///
    /// Metadata is the sole source of identity here: a missing or
    /// unparseable `x-user-id` is `Unauthenticated`; a role outside the
    /// enumerated set is `PermissionDenied`, never a default role.
    pub fn extract(headers: &HeaderMap) -> Result<Self, AuthError> {
        let user_id = headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or(AuthError::Unauthenticated)?
            .parse::<i64>()
            .map_err(|_| AuthError::Unauthenticated)?;

        let role_raw = headers
            .get(ROLE_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or(AuthError::Unauthenticated)?;
        let role = Role::parse(role_raw).ok_or(AuthError::PermissionDenied)?;

        let jti = headers
            .get(TOKEN_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(String::from);

        Ok(Self { user_id, role, jti })
    }

    /// Remove all identity metadata from a header map.
    ///
    /// The edge calls this on every inbound external request, before the
    /// public/protected classification, so spoofed metadata never survives.
    pub fn strip(headers: &mut HeaderMap) {
        headers.remove(USER_ID_HEADER);
        headers.remove(ROLE_HEADER);
        headers.remove(TOKEN_ID_HEADER);
    }
}

impl<S: Send + Sync> FromRequestParts<S> for TrustedIdentity {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        TrustedIdentity::extract(&parts.headers)
    }
}
