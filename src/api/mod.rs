// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 StreamGate

use axum::{
    middleware::from_fn_with_state,
    routing::{get, patch, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::edge_auth,
    models::{ChangePasswordRequest, LoginRequest, LoginResponse, MessageResponse, UserResponse},
    state::AppState,
};

pub mod health;
pub mod sessions;
pub mod users;

pub fn router(state: AppState) -> Router {
    let routes = Router::new()
        .route("/auth/login", post(sessions::login))
        .route("/auth/logout", post(sessions::logout))
        .route("/auth/me", get(users::current_user))
        .route("/auth/users", get(users::list_users))
        .route("/auth/users/{user_id}", patch(users::change_password))
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .with_state(state.clone());

    Router::new()
        .merge(routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        // Outermost on purpose: public/protected classification happens
        // before any other middleware sees the request.
        .layer(from_fn_with_state(state, edge_auth))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        sessions::login,
        sessions::logout,
        users::current_user,
        users::list_users,
        users::change_password,
        health::health,
        health::liveness
    ),
    components(
        schemas(
            LoginRequest,
            LoginResponse,
            UserResponse,
            ChangePasswordRequest,
            MessageResponse,
            crate::auth::Role,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Sessions", description = "Login and logout"),
        (name = "Users", description = "Account operations"),
        (name = "Health", description = "Probes")
    )
)]
struct ApiDoc;
