// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 StreamGate

//! Edge authentication middleware.
//!
//! This is the trust boundary. For every inbound request the middleware:
//!
//! 1. strips any identity metadata the outside world tried to smuggle in,
//! 2. classifies the endpoint against the static public allow-list
//!    (method + path prefix, evaluated before any other middleware),
//! 3. for protected endpoints, extracts the bearer token and runs the full
//!    verifier (signature → time bounds → revocation),
//! 4. on success, attaches the resulting identity as call metadata for the
//!    handlers behind it, which trust the metadata and never re-verify.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::propagation::TrustedIdentity;
use crate::state::AppState;
use crate::storage::{AuditEvent, AuditEventType};

use super::error::AuthError;

/// Endpoints reachable without identity, matched by method + path prefix.
const PUBLIC_ENDPOINTS: &[(&str, &str)] = &[
    ("POST", "/auth/login"),
    ("GET", "/health"),
    ("GET", "/docs"),
    ("GET", "/api-doc"),
];

fn is_public(method: &Method, path: &str) -> bool {
    PUBLIC_ENDPOINTS
        .iter()
        .any(|(m, prefix)| method.as_str() == *m && path.starts_with(prefix))
}

/// Extract the bearer token from the Authorization header.
fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::Unauthenticated)?
        .to_str()
        .map_err(|_| AuthError::Unauthenticated)?;
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .ok_or(AuthError::Unauthenticated)
}

/// Edge authentication middleware function.
///
/// Mount with `axum::middleware::from_fn_with_state(state, edge_auth)` as
/// the outermost layer.
pub async fn edge_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    // Identity metadata is only ever minted here; whatever arrived from the
    // outside is forged by definition.
    TrustedIdentity::strip(request.headers_mut());

    if is_public(request.method(), request.uri().path()) {
        return next.run(request).await;
    }

    let path = request.uri().path().to_string();

    let token = match bearer_token(request.headers()) {
        Ok(token) => token,
        Err(e) => return e.into_response(),
    };

    let claims = match state.verifier.verify(token).await {
        Ok(claims) => claims,
        Err(e) => {
            tracing::info!(path = %path, error_code = e.error_code(), "token rejected at edge");
            state.audit.record_best_effort(
                AuditEvent::new(AuditEventType::AuthFailure)
                    .with_details(serde_json::json!({ "path": path, "error_code": e.error_code() })),
            );
            return e.into_response();
        }
    };

    let identity = match TrustedIdentity::from_verified(&claims) {
        Ok(identity) => identity,
        Err(e) => return e.into_response(),
    };

    if let Err(e) = identity.inject(request.headers_mut()) {
        return e.into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::state::testing::test_state;
    use axum::{body::Body, middleware::from_fn_with_state, routing::get, Json, Router};
    use tower::ServiceExt;

    async fn whoami(identity: TrustedIdentity) -> Json<serde_json::Value> {
        Json(serde_json::json!({
            "user_id": identity.user_id,
            "role": identity.role,
        }))
    }

    async fn ping() -> &'static str {
        "pong"
    }

    fn router(state: AppState) -> Router {
        Router::new()
            .route("/whoami", get(whoami))
            .route("/health", get(ping))
            .layer(from_fn_with_state(state.clone(), edge_auth))
            .with_state(state)
    }

    fn get_request(path: &str) -> axum::http::request::Builder {
        axum::http::Request::builder().method("GET").uri(path)
    }

    #[test]
    fn classification_matches_method_and_prefix() {
        assert!(is_public(&Method::POST, "/auth/login"));
        assert!(is_public(&Method::GET, "/health/live"));
        assert!(!is_public(&Method::GET, "/auth/login"));
        assert!(!is_public(&Method::POST, "/auth/logout"));
    }

    #[tokio::test]
    async fn public_endpoint_needs_no_identity() {
        let (state, _dir) = test_state();
        let response = router(state)
            .oneshot(get_request("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
    }

    #[tokio::test]
    async fn protected_endpoint_without_token_is_401() {
        let (state, _dir) = test_state();
        let response = router(state)
            .oneshot(get_request("/whoami").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), 401);
    }

    #[tokio::test]
    async fn spoofed_metadata_without_token_is_rejected() {
        let (state, _dir) = test_state();
        let response = router(state)
            .oneshot(
                get_request("/whoami")
                    .header("x-user-id", "1")
                    .header("x-user-role", "admin")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), 401);
    }

    #[tokio::test]
    async fn verified_token_reaches_handler_as_metadata() {
        let (state, _dir) = test_state();
        let issued = state
            .issuer
            .issue(7, "user@streamgate.dev", Role::Client)
            .unwrap();

        let response = router(state)
            .oneshot(
                get_request("/whoami")
                    .header(AUTHORIZATION, format!("Bearer {}", issued.token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["user_id"], 7);
        assert_eq!(json["role"], "client");
    }

    #[tokio::test]
    async fn spoofed_metadata_is_overwritten_by_verified_identity() {
        let (state, _dir) = test_state();
        let issued = state
            .issuer
            .issue(7, "user@streamgate.dev", Role::Client)
            .unwrap();

        let response = router(state)
            .oneshot(
                get_request("/whoami")
                    .header(AUTHORIZATION, format!("Bearer {}", issued.token))
                    .header("x-user-id", "1")
                    .header("x-user-role", "admin")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["user_id"], 7);
        assert_eq!(json["role"], "client");
    }

    #[tokio::test]
    async fn malformed_bearer_scheme_is_401() {
        let (state, _dir) = test_state();
        let response = router(state)
            .oneshot(
                get_request("/whoami")
                    .header(AUTHORIZATION, "Token abc")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), 401);
    }
}
