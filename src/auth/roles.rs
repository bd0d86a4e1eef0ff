// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 StreamGate

//! User roles for authorization.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// User roles.
///
/// The hierarchy is flat: `Admin` is not implicitly `Client`. Operations that
/// want to grant admins blanket access do so explicitly through the policy
/// engine (`require_owner_or_role`), never by treating one role as a superset
/// of another.
///
/// There is intentionally no `Default` impl and no fallback in parsing: a
/// role string outside this set is not a valid authenticated state and maps
/// to a permission-denied outcome at the boundary that saw it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full administrative access
    Admin,
    /// Normal client user (owns their own account and resources)
    Client,
}

impl Role {
    /// Parse a role from its wire form (case-insensitive).
    ///
    /// Returns `None` for anything outside the enumerated set.
    pub fn parse(s: &str) -> Option<Role> {
        match s.to_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "client" => Some(Role::Client),
            _ => None,
        }
    }

    /// Wire form of the role, as carried in claims and call metadata.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Client => "client",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
