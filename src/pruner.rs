// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 StreamGate

//! # Revocation Pruner
//!
//! Background task that periodically deletes revocation records older than
//! the retention window. By then the tokens they belong to are already
//! rejected by the expiry check, so pruning is pure storage hygiene; the
//! verifier stays correct even if this task never runs.
//!
//! ## Shutdown
//!
//! Uses `tokio_util::sync::CancellationToken` for graceful shutdown, the
//! same pattern the server uses for request draining.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::storage::RevocationStore;

/// Background pruner for the revocation store.
pub struct RevocationPruner {
    store: Arc<dyn RevocationStore>,
    retention: Duration,
    interval: Duration,
}

impl RevocationPruner {
    pub fn new(store: Arc<dyn RevocationStore>, retention: Duration, interval: Duration) -> Self {
        Self {
            store,
            retention,
            interval,
        }
    }

    /// Run the prune loop until the cancellation token is triggered.
    ///
    /// Should be spawned as a background task:
    /// ```rust,ignore
    /// tokio::spawn(pruner.run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.interval.as_secs(),
            retention_secs = self.retention.as_secs(),
            "revocation pruner starting"
        );

        loop {
            if shutdown.is_cancelled() {
                info!("revocation pruner shutting down");
                return;
            }

            self.sweep().await;

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {},
                _ = shutdown.cancelled() => {
                    info!("revocation pruner shutting down");
                    return;
                }
            }
        }
    }

    /// Execute one sweep: drop records past retention.
    async fn sweep(&self) {
        let cutoff = Utc::now().timestamp() - self.retention.as_secs() as i64;
        let store = Arc::clone(&self.store);

        let result = tokio::task::spawn_blocking(move || store.prune_older_than(cutoff)).await;
        match result {
            Ok(Ok(0)) => {}
            Ok(Ok(removed)) => info!(removed, "pruned expired revocation records"),
            Ok(Err(e)) => warn!(error = %e, "revocation prune sweep failed"),
            Err(e) => warn!(error = %e, "revocation prune task panicked"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryRevocationStore;

    #[tokio::test]
    async fn sweep_keeps_records_inside_retention() {
        let store = Arc::new(InMemoryRevocationStore::new());
        store.revoke("7_100", 7).unwrap();

        let pruner = RevocationPruner::new(
            Arc::clone(&store) as Arc<dyn RevocationStore>,
            Duration::from_secs(3600),
            Duration::from_secs(3600),
        );
        pruner.sweep().await;

        assert!(store.is_revoked("7_100").unwrap());
    }

    #[tokio::test]
    async fn run_exits_on_cancellation() {
        let store = Arc::new(InMemoryRevocationStore::new());
        let pruner = RevocationPruner::new(
            store as Arc<dyn RevocationStore>,
            Duration::from_secs(3600),
            Duration::from_secs(3600),
        );

        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(pruner.run(shutdown.clone()));
        shutdown.cancel();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("pruner exits promptly")
            .expect("pruner task completes");
    }
}
