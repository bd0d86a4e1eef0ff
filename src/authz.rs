// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 StreamGate

//! # Authorization Policy Engine
//!
//! Two composable checks, applied by every service around its own data
//! operations, always in the same order: authenticate (a valid
//! [`TrustedIdentity`]) → authorize (role and/or ownership) → execute.
//!
//! Policy here: an authorized caller addressing a resource they may not
//! touch gets `PermissionDenied` (403), uniformly. The owned resources in
//! this service are keyed by a user id the caller supplied in the request,
//! so the 403 discloses nothing about existence the caller did not already
//! know.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::auth::{AuthError, Role};
use crate::propagation::TrustedIdentity;

/// Require the caller's role to equal `required`.
///
/// The hierarchy is flat: an admin calling a client-only operation is denied
/// just like the reverse. Operations that want admins anyway combine checks
/// (see [`require_owner_or_role`]).
pub fn require_role(identity: &TrustedIdentity, required: Role) -> Result<(), AuthError> {
    if identity.role == required {
        Ok(())
    } else {
        Err(AuthError::PermissionDenied)
    }
}

/// Grant access iff the caller owns the resource, or holds `override_role`.
///
/// `owner_id` is fetched by the calling service from its own data store; the
/// policy engine only consumes the fact.
pub fn require_owner_or_role(
    identity: &TrustedIdentity,
    owner_id: i64,
    override_role: Role,
) -> Result<(), AuthError> {
    if identity.user_id == owner_id || identity.role == override_role {
        Ok(())
    } else {
        Err(AuthError::PermissionDenied)
    }
}

/// Resources that carry an owner.
pub trait OwnedResource {
    fn owner_user_id(&self) -> i64;
}

/// Ownership gate for freshly fetched resources.
///
/// `None` means the resource does not exist at all (`NotFound`); an existing
/// resource owned by someone else is `PermissionDenied` unless the caller is
/// an admin.
pub trait OwnershipCheck<T> {
    fn authorize_owner_or_admin(self, identity: &TrustedIdentity) -> Result<T, AuthError>;
}

impl<T: OwnedResource> OwnershipCheck<T> for Option<T> {
    fn authorize_owner_or_admin(self, identity: &TrustedIdentity) -> Result<T, AuthError> {
        match self {
            Some(resource) => {
                require_owner_or_role(identity, resource.owner_user_id(), Role::Admin)?;
                Ok(resource)
            }
            None => Err(AuthError::NotFound),
        }
    }
}

/// Extractor that additionally requires the admin role.
pub struct AdminOnly(pub TrustedIdentity);

impl<S: Send + Sync> FromRequestParts<S> for AdminOnly {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let identity = TrustedIdentity::from_request_parts(parts, state).await?;
        require_role(&identity, Role::Admin)?;
        Ok(AdminOnly(identity))
    }
}
