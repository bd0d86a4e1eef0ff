// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 StreamGate

//! Audit logging for security-sensitive operations.
//!
//! Login, logout, password changes and denied attempts are appended to a
//! JSONL file under the data directory. Audit writes are best-effort from
//! the request's point of view: a failed append is logged and the request
//! still completes.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{StoreError, StoreResult};

/// Types of auditable events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    Login,
    Logout,
    PasswordChanged,
    AuthFailure,
    PermissionDenied,
}

/// An audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event ID.
    pub event_id: String,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// Type of event.
    pub event_type: AuditEventType,
    /// User who triggered the event (if known).
    pub user_id: Option<i64>,
    /// Additional details as JSON.
    pub details: Option<serde_json::Value>,
}

impl AuditEvent {
    /// Create a new audit event.
    pub fn new(event_type: AuditEventType) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type,
            user_id: None,
            details: None,
        }
    }

    /// Set the user ID.
    pub fn with_user(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Add details.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Append-only JSONL audit log.
pub struct AuditLog {
    file: Mutex<File>,
}

impl AuditLog {
    /// Open (or create) the audit log under the given data directory.
    pub fn open(data_dir: &Path) -> StoreResult<Self> {
        std::fs::create_dir_all(data_dir)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(data_dir.join("audit.jsonl"))?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Append one event as a single JSON line.
    pub fn record(&self, event: AuditEvent) -> StoreResult<()> {
        let mut line = serde_json::to_vec(&event)?;
        line.push(b'\n');
        let mut file = self
            .file
            .lock()
            .map_err(|_| StoreError::Internal("audit mutex poisoned".to_string()))?;
        file.write_all(&line)?;
        Ok(())
    }

    /// Record an event, demoting failures to a warning.
    pub fn record_best_effort(&self, event: AuditEvent) {
        if let Err(e) = self.record(event) {
            tracing::warn!(error = %e, "failed to append audit event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn events_are_appended_as_json_lines() {
        let dir = TempDir::new().unwrap();
        let log = AuditLog::open(dir.path()).unwrap();

        log.record(AuditEvent::new(AuditEventType::Login).with_user(7))
            .unwrap();
        log.record(
            AuditEvent::new(AuditEventType::Logout)
                .with_user(7)
                .with_details(serde_json::json!({"jti": "7_100"})),
        )
        .unwrap();

        let contents = std::fs::read_to_string(dir.path().join("audit.jsonl")).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: AuditEvent = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.event_type, AuditEventType::Login);
        assert_eq!(first.user_id, Some(7));

        let second: AuditEvent = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second.details.unwrap()["jti"], "7_100");
    }
}
