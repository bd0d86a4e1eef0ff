// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 StreamGate

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use streamgate::api::router;
use streamgate::auth::Role;
use streamgate::config::Config;
use streamgate::pruner::RevocationPruner;
use streamgate::state::AppState;
use streamgate::storage::{AuditLog, NewUser, RevocationDb, RevocationStore, StoreError, UserDb};

#[tokio::main]
async fn main() {
    init_tracing();

    // Loss or misconfiguration of the signing secret is fatal here, never a
    // per-request error later.
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            std::process::exit(1);
        }
    };

    let revocations = RevocationDb::open(&config.data_dir.join("revocations.redb"))
        .expect("failed to open revocation store");
    let users = UserDb::open(&config.data_dir.join("users.redb")).expect("failed to open user store");
    let audit = AuditLog::open(&config.data_dir).expect("failed to open audit log");

    if let Some((email, password)) = &config.seed_admin {
        match users.create(NewUser {
            first_name: "Admin".to_string(),
            last_name: "StreamGate".to_string(),
            email: email.clone(),
            password: password.clone(),
            role: Role::Admin,
        }) {
            Ok(user) => info!(user_id = user.id, "seeded admin account"),
            Err(StoreError::AlreadyExists(_)) => {}
            Err(e) => panic!("failed to seed admin account: {e}"),
        }
    }

    let revocations: Arc<dyn RevocationStore> = Arc::new(revocations);
    let shutdown = CancellationToken::new();

    let pruner = RevocationPruner::new(
        Arc::clone(&revocations),
        config.revocation_retention,
        config.prune_interval,
    );
    tokio::spawn(pruner.run(shutdown.clone()));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("failed to parse bind address");

    let state = AppState::new(config, revocations, users, audit);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind");
    info!(%addr, "streamgate listening (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown(shutdown))
        .await
        .expect("server failed");
}

/// Select a log format once at startup: `LOG_FORMAT=json` for machines,
/// anything else for humans.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Resolve on SIGINT/SIGTERM, cancelling the background tasks so the server
/// drains in-flight requests and exits.
async fn wait_for_shutdown(shutdown: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
    shutdown.cancel();

    // Give the pruner a beat to notice before the runtime winds down.
    tokio::time::sleep(Duration::from_millis(50)).await;
}
