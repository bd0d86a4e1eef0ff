// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 StreamGate

//! User endpoints: current-user lookup and password change.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::auth::Role;
use crate::authz::{require_owner_or_role, AdminOnly};
use crate::error::ApiError;
use crate::models::{ChangePasswordRequest, MessageResponse, UserResponse};
use crate::propagation::TrustedIdentity;
use crate::state::AppState;
use crate::storage::{run_bounded, AuditEvent, AuditEventType};

/// Get the current authenticated user's profile.
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Missing or invalid identity"),
        (status = 404, description = "Account no longer exists"),
    )
)]
pub async fn current_user(
    State(state): State<AppState>,
    identity: TrustedIdentity,
) -> Result<Json<UserResponse>, ApiError> {
    let users = Arc::clone(&state.users);
    let user_id = identity.user_id;
    let record = run_bounded(state.config.store_timeout, move || users.find(user_id))
        .await?
        .ok_or_else(|| ApiError::not_found("account not found"))?;

    Ok(Json(record.into()))
}

/// List all accounts. Admin only; the flat role check denies a client even
/// when they own one of the listed accounts.
#[utoipa::path(
    get,
    path = "/auth/users",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "All live accounts", body = [UserResponse]),
        (status = 401, description = "Missing or invalid identity"),
        (status = 403, description = "Caller is not an admin"),
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    AdminOnly(_identity): AdminOnly,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = Arc::clone(&state.users);
    let records = run_bounded(state.config.store_timeout, move || users.list()).await?;

    Ok(Json(records.into_iter().map(UserResponse::from).collect()))
}

/// Change a user's password.
///
/// Ownership-gated with an admin override: a user may change their own
/// password after presenting the current one; an admin may change any
/// account's password without it. Authorization runs before the target
/// account is even looked up, so a denied caller learns nothing.
#[utoipa::path(
    patch,
    path = "/auth/users/{user_id}",
    tag = "Users",
    security(("bearer" = [])),
    params(("user_id" = i64, Path, description = "Account whose password changes")),
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password updated", body = MessageResponse),
        (status = 400, description = "Password confirmation or current password wrong"),
        (status = 403, description = "Caller is neither the owner nor an admin"),
        (status = 404, description = "Account not found"),
    )
)]
pub async fn change_password(
    State(state): State<AppState>,
    identity: TrustedIdentity,
    Path(target_id): Path<i64>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if let Err(denied) = require_owner_or_role(&identity, target_id, Role::Admin) {
        tracing::info!(
            user_id = identity.user_id,
            target_id,
            "password change denied"
        );
        state.audit.record_best_effort(
            AuditEvent::new(AuditEventType::PermissionDenied)
                .with_user(identity.user_id)
                .with_details(serde_json::json!({ "target_user_id": target_id })),
        );
        return Err(denied.into());
    }

    if request.new_password != request.confirm_new_password {
        return Err(ApiError::bad_request("passwords do not match"));
    }

    // The current password is only demanded of users changing their own;
    // an admin resetting someone else's account does not know it.
    if identity.user_id == target_id {
        let users = Arc::clone(&state.users);
        let current = request.current_password.clone();
        let valid = run_bounded(state.config.store_timeout, move || {
            users.check_password(target_id, &current)
        })
        .await?;
        if !valid {
            return Err(ApiError::bad_request("current password is incorrect"));
        }
    }

    let users = Arc::clone(&state.users);
    let new_password = request.new_password.clone();
    run_bounded(state.config.store_timeout, move || {
        users.set_password(target_id, &new_password)
    })
    .await?;

    tracing::info!(user_id = identity.user_id, target_id, "password updated");
    state.audit.record_best_effort(
        AuditEvent::new(AuditEventType::PasswordChanged)
            .with_user(identity.user_id)
            .with_details(serde_json::json!({ "target_user_id": target_id })),
    );

    Ok(Json(MessageResponse {
        message: "password updated".to_string(),
    }))
}
