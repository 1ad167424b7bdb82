use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use std::sync::Arc;

use storefront_core::favorites::{Favorite, FavoriteRepositoryTrait};
use storefront_core::products::Product;
use storefront_core::Result;

use super::model::FavoriteDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::products::ProductDB;
use crate::schema::{favorites, products};

pub struct FavoriteRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl FavoriteRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        FavoriteRepository { pool, writer }
    }

    pub fn list_favorites_for_user(&self, user_id: &str) -> Result<Vec<Favorite>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = favorites::table
            .filter(favorites::user_id.eq(user_id))
            .order(favorites::created_at.asc())
            .load::<FavoriteDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(Favorite::from).collect())
    }
}

#[async_trait]
impl FavoriteRepositoryTrait for FavoriteRepository {
    async fn add_favorite(&self, user_id: String, product_id: String) -> Result<bool> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<bool> {
                let inserted = diesel::insert_or_ignore_into(favorites::table)
                    .values(&FavoriteDB {
                        user_id,
                        product_id,
                        created_at: Utc::now().to_rfc3339(),
                    })
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(inserted > 0)
            })
            .await
    }

    async fn remove_favorite(&self, user_id: String, product_id: String) -> Result<usize> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                Ok(diesel::delete(favorites::table.find((user_id, product_id)))
                    .execute(conn)
                    .map_err(StorageError::from)?)
            })
            .await
    }

    fn is_favorite(&self, user_id: &str, product_id: &str) -> Result<bool> {
        let mut conn = get_connection(&self.pool)?;
        let count: i64 = favorites::table
            .find((user_id, product_id))
            .count()
            .get_result(&mut conn)
            .map_err(StorageError::from)?;
        Ok(count > 0)
    }

    fn list_favorite_products(&self, user_id: &str) -> Result<Vec<Product>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = favorites::table
            .inner_join(products::table)
            .filter(favorites::user_id.eq(user_id))
            .order((favorites::created_at.asc(), products::name.asc()))
            .select(ProductDB::as_select())
            .load::<ProductDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(Product::from).collect())
    }
}
