// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 StreamGate

//! # Authentication Module
//!
//! Token lifecycle for the platform: issuance, verification, and the edge
//! middleware that ties them to HTTP.
//!
//! ## Flow
//!
//! 1. A user logs in at the edge with credentials; the user store verifies
//!    them and the [`TokenIssuer`] signs a time-bounded token (HS256,
//!    shared symmetric secret)
//! 2. On every later request the edge middleware runs the [`TokenVerifier`]:
//!    signature, then time bounds, then the revocation list
//! 3. On success the identity travels to handlers as call metadata (see
//!    `crate::propagation`); the edge is the only signature-verification
//!    point in the system
//! 4. Logout inserts the token's jti into the revocation store, which the
//!    verifier consults on every call
//!
//! ## Security
//!
//! - The signing secret is loaded once at startup; a missing or short
//!   secret aborts the process
//! - Verification failures short-circuit in a fixed order and never reveal
//!   which later check would also have failed
//! - Expired, revoked, and malformed tokens stay distinguishable end to end
//!   for logging and metrics

pub mod claims;
pub mod error;
pub mod issuer;
pub mod middleware;
pub mod roles;
pub mod verifier;

pub use claims::Claims;
pub use error::AuthError;
pub use issuer::{IssuedToken, TokenIssuer};
pub use middleware::edge_auth;
pub use roles::Role;
pub use verifier::TokenVerifier;
