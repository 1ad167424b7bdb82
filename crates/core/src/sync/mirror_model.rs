//! Mirror domain models: remote snapshots, notifications and engine status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{MirrorRetryClass, ResubscribePolicy};

/// Collection name the mirror follows unless configured otherwise.
pub const DEFAULT_PRODUCTS_COLLECTION: &str = "products";

/// One document as delivered by the remote store: its id plus raw fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteDocument {
    pub id: String,
    #[serde(default)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl RemoteDocument {
    pub fn new(id: impl Into<String>, fields: serde_json::Value) -> Self {
        let fields = match fields {
            serde_json::Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        Self {
            id: id.into(),
            fields,
        }
    }
}

/// The full document set delivered by one change notification.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteSnapshot {
    pub documents: Vec<RemoteDocument>,
    pub received_at: DateTime<Utc>,
}

impl RemoteSnapshot {
    pub fn new(documents: Vec<RemoteDocument>) -> Self {
        Self {
            documents,
            received_at: Utc::now(),
        }
    }
}

/// Listener-level failure (connectivity, permission, quota).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFailure {
    pub message: String,
    pub retry_class: MirrorRetryClass,
}

impl RemoteFailure {
    pub fn retryable(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retry_class: MirrorRetryClass::Retryable,
        }
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retry_class: MirrorRetryClass::Permanent,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotNotification {
    Snapshot(RemoteSnapshot),
    Error(RemoteFailure),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MirrorState {
    /// Listening and applying snapshots.
    #[default]
    Subscribed,
    /// Waiting out a backoff before resubscribing.
    Retrying,
    /// Gave up after an error; nothing more will be applied.
    FailedSilent,
    /// Shut down by its owner.
    Stopped,
}

impl MirrorState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Subscribed => "subscribed",
            Self::Retrying => "retrying",
            Self::FailedSilent => "failed_silent",
            Self::Stopped => "stopped",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "subscribed" => Some(Self::Subscribed),
            "retrying" => Some(Self::Retrying),
            "failed_silent" => Some(Self::FailedSilent),
            "stopped" => Some(Self::Stopped),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::FailedSilent | Self::Stopped)
    }
}

/// What the mirror does with local products absent from a snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileMode {
    /// Leave them; order history may still reference them.
    #[default]
    KeepMissing,
    /// Delete them so the local table matches the snapshot exactly.
    DeleteMissing,
}

impl ReconcileMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "keep" | "keep_missing" => Some(Self::KeepMissing),
            "delete" | "delete_missing" => Some(Self::DeleteMissing),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MirrorConfig {
    pub resubscribe: ResubscribePolicy,
    pub reconcile: ReconcileMode,
}

/// Counts from applying one snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotApplyOutcome {
    pub upserted: usize,
    pub dropped: usize,
    pub deleted: usize,
}

/// Observable health of the mirror, published on every transition and
/// persisted between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MirrorStatus {
    pub state: MirrorState,
    pub snapshots_applied: i64,
    pub last_snapshot_at: Option<String>,
    pub last_upserted: i64,
    pub last_dropped: i64,
    pub last_deleted: i64,
    pub last_error: Option<String>,
    pub last_error_at: Option<String>,
    pub consecutive_failures: i32,
    pub resubscriptions: i32,
    pub next_retry_at: Option<String>,
    pub updated_at: Option<String>,
}

impl MirrorStatus {
    pub fn record_applied(&mut self, outcome: &SnapshotApplyOutcome) {
        let now = Utc::now().to_rfc3339();
        self.snapshots_applied += 1;
        self.last_snapshot_at = Some(now.clone());
        self.last_upserted = outcome.upserted as i64;
        self.last_dropped = outcome.dropped as i64;
        self.last_deleted = outcome.deleted as i64;
        self.consecutive_failures = 0;
        self.updated_at = Some(now);
    }

    pub fn record_error(&mut self, message: impl Into<String>) {
        let now = Utc::now().to_rfc3339();
        self.last_error = Some(message.into());
        self.last_error_at = Some(now.clone());
        self.consecutive_failures += 1;
        self.updated_at = Some(now);
    }

    pub fn transition(&mut self, state: MirrorState) {
        self.state = state;
        if state != MirrorState::Retrying {
            self.next_retry_at = None;
        }
        self.updated_at = Some(Utc::now().to_rfc3339());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirror_state_strings_round_trip() {
        for state in [
            MirrorState::Subscribed,
            MirrorState::Retrying,
            MirrorState::FailedSilent,
            MirrorState::Stopped,
        ] {
            assert_eq!(MirrorState::parse(state.as_str()), Some(state));
            assert_eq!(
                serde_json::to_string(&state).unwrap(),
                format!("\"{}\"", state.as_str())
            );
        }
    }

    #[test]
    fn reconcile_mode_parses_config_values() {
        assert_eq!(ReconcileMode::parse("keep"), Some(ReconcileMode::KeepMissing));
        assert_eq!(
            ReconcileMode::parse(" DELETE "),
            Some(ReconcileMode::DeleteMissing)
        );
        assert_eq!(ReconcileMode::parse("sometimes"), None);
    }

    #[test]
    fn applied_snapshot_clears_failure_streak() {
        let mut status = MirrorStatus::default();
        status.record_error("offline");
        status.record_error("offline");
        assert_eq!(status.consecutive_failures, 2);

        status.record_applied(&SnapshotApplyOutcome {
            upserted: 3,
            dropped: 1,
            deleted: 0,
        });
        assert_eq!(status.consecutive_failures, 0);
        assert_eq!(status.snapshots_applied, 1);
        assert_eq!(status.last_upserted, 3);
        assert_eq!(status.last_dropped, 1);
        assert_eq!(status.last_error.as_deref(), Some("offline"));
    }

    #[test]
    fn remote_document_ignores_non_object_fields() {
        let doc = RemoteDocument::new("p1", serde_json::json!([1, 2]));
        assert!(doc.fields.is_empty());
    }
}
