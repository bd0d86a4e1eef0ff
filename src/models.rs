// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 StreamGate

//! Request/response models for the auth API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::Role;
use crate::storage::UserRecord;

/// Body of `POST /auth/login`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// A user as exposed through the API. Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<UserRecord> for UserResponse {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            first_name: record.first_name,
            last_name: record.last_name,
            email: record.email,
            role: record.role,
            created_at: record.created_at,
        }
    }
}

/// Response of `POST /auth/login`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoginResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub token_type: String,
}

/// Body of `PATCH /auth/users/{user_id}`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ChangePasswordRequest {
    /// Required when a user changes their own password; ignored when an
    /// admin changes someone else's.
    #[serde(default)]
    pub current_password: String,
    pub new_password: String,
    pub confirm_new_password: String,
}

/// Generic confirmation message.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}
