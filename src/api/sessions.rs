// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 StreamGate

//! Session endpoints: login (token issuance) and logout (revocation).

use std::sync::Arc;

use axum::{extract::State, Json};

use crate::auth::AuthError;
use crate::error::ApiError;
use crate::models::{LoginRequest, LoginResponse, MessageResponse};
use crate::propagation::TrustedIdentity;
use crate::state::AppState;
use crate::storage::{run_bounded, AuditEvent, AuditEventType};

/// Authenticate with email + password and receive a bearer token.
///
/// Unknown email, wrong password and soft-deleted account all produce the
/// same answer, so the endpoint confirms nothing about which part failed.
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Sessions",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = LoginResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 503, description = "User store unavailable"),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let users = Arc::clone(&state.users);
    let email = request.email.clone();
    let authenticated = run_bounded(state.config.store_timeout, move || {
        users.authenticate(&email, &request.password)
    })
    .await?;

    let Some(user) = authenticated else {
        tracing::info!(email = %request.email, "login rejected");
        state.audit.record_best_effort(
            AuditEvent::new(AuditEventType::AuthFailure)
                .with_details(serde_json::json!({ "email": request.email })),
        );
        return Err(ApiError::unauthorized("invalid credentials"));
    };

    let issued = state.issuer.issue(user.id, &user.email, user.role)?;

    tracing::info!(user_id = user.id, role = %user.role, "user logged in");
    state
        .audit
        .record_best_effort(AuditEvent::new(AuditEventType::Login).with_user(user.id));

    Ok(Json(LoginResponse {
        user: user.into(),
        access_token: issued.token,
        token_type: "bearer".to_string(),
    }))
}

/// Revoke the presented token.
///
/// Revocation is idempotent at the store level; the rare case of the same
/// token being logged out from two tabs at once succeeds on both.
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "Sessions",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Session closed", body = MessageResponse),
        (status = 401, description = "Missing or invalid identity"),
        (status = 503, description = "Revocation store unavailable"),
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    identity: TrustedIdentity,
) -> Result<Json<MessageResponse>, ApiError> {
    // The edge always forwards the jti; its absence means the call did not
    // come through the edge at all.
    let jti = identity.jti.clone().ok_or(AuthError::Unauthenticated)?;

    let store = Arc::clone(&state.revocations);
    let user_id = identity.user_id;
    let record_jti = jti.clone();
    run_bounded(state.config.store_timeout, move || {
        store.revoke(&record_jti, user_id)
    })
    .await?;

    tracing::info!(user_id, jti = %jti, "user logged out");
    state.audit.record_best_effort(
        AuditEvent::new(AuditEventType::Logout)
            .with_user(user_id)
            .with_details(serde_json::json!({ "jti": jti })),
    );

    Ok(Json(MessageResponse {
        message: "session closed".to_string(),
    }))
}
