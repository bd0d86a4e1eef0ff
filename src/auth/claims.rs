// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 StreamGate

//! JWT claims carried by every issued token.

use serde::{Deserialize, Serialize};

use super::error::AuthError;
use super::roles::Role;

/// The structured fields encoded inside a token.
///
/// Immutable once issued: the issuer creates them, the verifier reads them,
/// nothing mutates them. A token is logically destroyed by its `exp` passing
/// or by a revocation record keyed on its `jti`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id as an integer string.
    pub sub: String,

    /// Email of the subject at issuance time.
    pub email: String,

    /// Role of the subject at issuance time. Deserialization is strict, so a
    /// token carrying a role outside the enumerated set fails structural
    /// validation rather than collapsing to some default.
    pub role: Role,

    /// Unique id of this token; the revocation key.
    pub jti: String,

    /// Issued-at (Unix seconds).
    pub iat: i64,

    /// Not-before (Unix seconds).
    pub nbf: i64,

    /// Expires-at (Unix seconds).
    pub exp: i64,
}

impl Claims {
    /// Parse the subject as a numeric user id.
    ///
    /// A non-numeric subject means the token structure is broken, which is
    /// an `InvalidToken`, not a denied permission.
    pub fn user_id(&self) -> Result<i64, AuthError> {
        self.sub.parse().map_err(|_| AuthError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn sample_claims() -> Claims {
        Claims {
            sub: "7".to_string(),
            email: "user@streamgate.dev".to_string(),
            role: Role::Client,
            jti: "7_1700000000000000000".to_string(),
            iat: 1_700_000_000,
            nbf: 1_700_000_000,
            exp: 1_700_086_400,
        }
    }

    #[test]
    fn user_id_parses_numeric_subject() {
        assert_eq!(sample_claims().user_id().unwrap(), 7);
    }

    #[test]
    fn user_id_rejects_non_numeric_subject() {
        let mut claims = sample_claims();
        claims.sub = "user_7".to_string();
        assert!(matches!(claims.user_id(), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn claims_with_unknown_role_fail_deserialization() {
        let raw = r#"{
            "sub": "7",
            "email": "user@streamgate.dev",
            "role": "superuser",
            "jti": "7_1",
            "iat": 0,
            "nbf": 0,
            "exp": 1
        }"#;
        assert!(serde_json::from_str::<Claims>(raw).is_err());
    }
}
