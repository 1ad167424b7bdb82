use async_trait::async_trait;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use std::collections::HashMap;
use std::sync::Arc;

use storefront_core::settings::SettingsRepositoryTrait;
use storefront_core::Result;

use super::model::AppSettingDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::app_settings;

pub struct SettingsRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl SettingsRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        SettingsRepository { pool, writer }
    }
}

#[async_trait]
impl SettingsRepositoryTrait for SettingsRepository {
    fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let mut conn = get_connection(&self.pool)?;
        Ok(app_settings::table
            .find(key)
            .select(app_settings::setting_value)
            .first::<String>(&mut conn)
            .optional()
            .map_err(StorageError::from)?)
    }

    fn list_settings(&self) -> Result<HashMap<String, String>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = app_settings::table
            .load::<AppSettingDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows
            .into_iter()
            .map(|row| (row.setting_key, row.setting_value))
            .collect())
    }

    async fn set_setting(&self, key: String, value: String) -> Result<()> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                let row = AppSettingDB {
                    setting_key: key,
                    setting_value: value,
                };
                diesel::insert_into(app_settings::table)
                    .values(&row)
                    .on_conflict(app_settings::setting_key)
                    .do_update()
                    .set(app_settings::setting_value.eq(&row.setting_value))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    async fn delete_setting(&self, key: String) -> Result<usize> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                Ok(diesel::delete(app_settings::table.find(key))
                    .execute(conn)
                    .map_err(StorageError::from)?)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_db;

    #[tokio::test]
    async fn set_overwrites_and_delete_removes() {
        let db = setup_db();
        let repo = SettingsRepository::new(db.pool.clone(), db.writer.clone());

        repo.set_setting("theme".to_string(), "dark".to_string())
            .await
            .unwrap();
        repo.set_setting("theme".to_string(), "light".to_string())
            .await
            .unwrap();
        assert_eq!(repo.get_setting("theme").unwrap().as_deref(), Some("light"));
        assert_eq!(repo.list_settings().unwrap().len(), 1);

        assert_eq!(repo.delete_setting("theme".to_string()).await.unwrap(), 1);
        assert_eq!(repo.get_setting("theme").unwrap(), None);
        assert_eq!(repo.delete_setting("theme".to_string()).await.unwrap(), 0);
    }
}
