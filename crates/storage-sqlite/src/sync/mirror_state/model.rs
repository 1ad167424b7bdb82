//! Database model for the single-row mirror state table.

use chrono::Utc;
use diesel::prelude::*;
use log::warn;
use serde::{Deserialize, Serialize};

use storefront_core::sync::{MirrorState, MirrorStatus};

pub const MIRROR_STATE_ROW_ID: i32 = 1;

#[derive(
    Queryable,
    Identifiable,
    Insertable,
    AsChangeset,
    Selectable,
    Debug,
    Clone,
    Serialize,
    Deserialize,
)]
#[diesel(table_name = crate::schema::mirror_state)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct MirrorStateDB {
    pub id: i32,
    pub state: String,
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
    pub updated_at: String,
}

impl From<MirrorStatus> for MirrorStateDB {
    fn from(status: MirrorStatus) -> Self {
        Self {
            id: MIRROR_STATE_ROW_ID,
            state: status.state.as_str().to_string(),
            snapshots_applied: status.snapshots_applied,
            last_snapshot_at: status.last_snapshot_at,
            last_upserted: status.last_upserted,
            last_dropped: status.last_dropped,
            last_deleted: status.last_deleted,
            last_error: status.last_error,
            last_error_at: status.last_error_at,
            consecutive_failures: status.consecutive_failures,
            resubscriptions: status.resubscriptions,
            next_retry_at: status.next_retry_at,
            updated_at: status
                .updated_at
                .unwrap_or_else(|| Utc::now().to_rfc3339()),
        }
    }
}

impl From<MirrorStateDB> for MirrorStatus {
    fn from(db: MirrorStateDB) -> Self {
        let state = MirrorState::parse(&db.state).unwrap_or_else(|| {
            warn!("[Storage] Unknown mirror state '{}', reading as stopped", db.state);
            MirrorState::Stopped
        });
        Self {
            state,
            snapshots_applied: db.snapshots_applied,
            last_snapshot_at: db.last_snapshot_at,
            last_upserted: db.last_upserted,
            last_dropped: db.last_dropped,
            last_deleted: db.last_deleted,
            last_error: db.last_error,
            last_error_at: db.last_error_at,
            consecutive_failures: db.consecutive_failures,
            resubscriptions: db.resubscriptions,
            next_retry_at: db.next_retry_at,
            updated_at: Some(db.updated_at),
        }
    }
}
