//! Repository for the mirror's persisted health record.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use storefront_core::errors::Result;
use storefront_core::sync::{MirrorStatus, MirrorStatusRepositoryTrait};

use super::model::{MirrorStateDB, MIRROR_STATE_ROW_ID};
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::mirror_state;

pub struct MirrorStatusRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl MirrorStatusRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl MirrorStatusRepositoryTrait for MirrorStatusRepository {
    fn get_mirror_status(&self) -> Result<Option<MirrorStatus>> {
        let mut conn = get_connection(&self.pool)?;
        let row = mirror_state::table
            .find(MIRROR_STATE_ROW_ID)
            .first::<MirrorStateDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(row.map(MirrorStatus::from))
    }

    async fn save_mirror_status(&self, status: MirrorStatus) -> Result<()> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                let row = MirrorStateDB::from(status);
                diesel::insert_into(mirror_state::table)
                    .values(&row)
                    .on_conflict(mirror_state::id)
                    .do_update()
                    .set(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }
}
