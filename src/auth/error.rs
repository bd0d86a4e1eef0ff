// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 StreamGate

//! Authentication and authorization errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Error taxonomy for the whole identity path.
///
/// Every variant is terminal for the call that produced it; neither the
/// verifier nor the policy engine attempts recovery. Only `Unavailable` is
/// legitimately retryable by the caller with the same input.
///
/// The failure kinds stay distinguishable all the way to the edge response
/// (`error_code` field) so operators can tell an expired token from a revoked
/// one without the caller having to guess.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No identity was presented, or it could not be parsed at all.
    #[error("authentication required")]
    Unauthenticated,

    /// The token's signature or structure did not verify, or the token is
    /// not yet valid.
    #[error("token is invalid")]
    InvalidToken,

    /// The token's expiry has passed.
    #[error("token has expired")]
    TokenExpired,

    /// The token was explicitly revoked (logout).
    #[error("token has been revoked")]
    TokenRevoked,

    /// Role or ownership check failed.
    #[error("permission denied for this operation")]
    PermissionDenied,

    /// The addressed resource does not exist.
    #[error("resource not found")]
    NotFound,

    /// A backing store did not answer within its deadline. Retryable.
    #[error("service temporarily unavailable")]
    Unavailable,

    /// Signing failure or another unexpected internal condition. The detail
    /// is logged, never surfaced to the caller.
    #[error("internal authentication error")]
    Internal(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Stable machine-readable code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::Unauthenticated => "unauthenticated",
            AuthError::InvalidToken => "invalid_token",
            AuthError::TokenExpired => "token_expired",
            AuthError::TokenRevoked => "token_revoked",
            AuthError::PermissionDenied => "permission_denied",
            AuthError::NotFound => "not_found",
            AuthError::Unavailable => "unavailable",
            AuthError::Internal(_) => "internal_error",
        }
    }

    /// HTTP status this error maps to at the edge.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Unauthenticated
            | AuthError::InvalidToken
            | AuthError::TokenExpired
            | AuthError::TokenRevoked => StatusCode::UNAUTHORIZED,
            AuthError::PermissionDenied => StatusCode::FORBIDDEN,
            AuthError::NotFound => StatusCode::NOT_FOUND,
            AuthError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let AuthError::Internal(detail) = &self {
            tracing::error!(detail = %detail, "internal authentication error");
        }
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn token_errors_return_401_with_distinct_codes() {
        for (err, code) in [
            (AuthError::InvalidToken, "invalid_token"),
            (AuthError::TokenExpired, "token_expired"),
            (AuthError::TokenRevoked, "token_revoked"),
        ] {
            let response = err.into_response();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

            let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
            assert_eq!(body["error_code"], code);
        }
    }

    #[tokio::test]
    async fn permission_denied_returns_403() {
        let response = AuthError::PermissionDenied.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn unavailable_returns_503() {
        let response = AuthError::Unavailable.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn internal_detail_is_not_leaked() {
        let response = AuthError::Internal("secret backend detail".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert!(!body.contains("secret backend detail"));
    }
}
