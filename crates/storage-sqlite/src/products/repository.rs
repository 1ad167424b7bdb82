use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use std::sync::Arc;

use storefront_core::products::{Product, ProductFilter, ProductRepositoryTrait, ProductSort};
use storefront_core::Result;

use super::model::ProductDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::products;
use crate::utils::escape_like;

pub struct ProductRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

const KEEP_ID_CHUNK: usize = 500;

diesel::table! {
    /// Connection-local scratch table holding a reconciliation keep-list.
    mirror_keep_ids (id) {
        id -> Text,
    }
}

fn upsert_rows(conn: &mut SqliteConnection, products_to_write: Vec<Product>) -> Result<usize> {
    let now = Utc::now().to_rfc3339();
    let mut written = 0;
    for product in products_to_write {
        let row = ProductDB::from_domain(product, &now);
        written += diesel::insert_into(products::table)
            .values(&row)
            .on_conflict(products::id)
            .do_update()
            .set(&row)
            .execute(conn)
            .map_err(StorageError::from)?;
    }
    Ok(written)
}

/// Stages `keep_ids` in a temp table in bounded chunks, so the delete binds
/// no parameters however large the keep-list is.
fn delete_rows_except(conn: &mut SqliteConnection, keep_ids: &[String]) -> Result<usize> {
    diesel::sql_query("CREATE TEMP TABLE IF NOT EXISTS mirror_keep_ids (id TEXT PRIMARY KEY NOT NULL)")
        .execute(conn)
        .map_err(StorageError::from)?;
    diesel::delete(mirror_keep_ids::table)
        .execute(conn)
        .map_err(StorageError::from)?;
    for chunk in keep_ids.chunks(KEEP_ID_CHUNK) {
        let rows: Vec<_> = chunk
            .iter()
            .map(|id| mirror_keep_ids::id.eq(id.as_str()))
            .collect();
        diesel::insert_or_ignore_into(mirror_keep_ids::table)
            .values(rows)
            .execute(conn)
            .map_err(StorageError::from)?;
    }
    let deleted = diesel::sql_query(
        "DELETE FROM products WHERE id NOT IN (SELECT id FROM mirror_keep_ids)",
    )
    .execute(conn)
    .map_err(StorageError::from)?;
    diesel::delete(mirror_keep_ids::table)
        .execute(conn)
        .map_err(StorageError::from)?;
    Ok(deleted)
}

impl ProductRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        ProductRepository { pool, writer }
    }
}

#[async_trait]
impl ProductRepositoryTrait for ProductRepository {
    fn get_product(&self, product_id: &str) -> Result<Option<Product>> {
        let mut conn = get_connection(&self.pool)?;
        let row = products::table
            .find(product_id)
            .first::<ProductDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(row.map(Product::from))
    }

    fn list_products(&self) -> Result<Vec<Product>> {
        self.search_products(&ProductFilter::default())
    }

    fn search_products(&self, filter: &ProductFilter) -> Result<Vec<Product>> {
        let filter = filter.normalized();
        let mut conn = get_connection(&self.pool)?;

        let mut query = products::table.into_boxed();
        if let Some(text) = &filter.query {
            let pattern = format!("%{}%", escape_like(text));
            query = query.filter(
                products::name
                    .like(pattern.clone())
                    .escape('\\')
                    .or(products::brand.like(pattern.clone()).escape('\\'))
                    .or(products::category.like(pattern).escape('\\')),
            );
        }
        if let Some(category) = &filter.category {
            // LIKE without wildcards: a case-insensitive equality.
            query = query.filter(products::category.like(escape_like(category)).escape('\\'));
        }
        if filter.in_stock_only {
            query = query.filter(products::stock.gt(0));
        }

        let rows = query
            .order((products::name.asc(), products::id.asc()))
            .load::<ProductDB>(&mut conn)
            .map_err(StorageError::from)?;
        let mut found: Vec<Product> = rows.into_iter().map(Product::from).collect();

        // Prices are TEXT in SQLite, so numeric ordering happens here.
        match filter.sort {
            ProductSort::NameAsc => {}
            ProductSort::PriceAsc => found.sort_by(|a, b| a.price.cmp(&b.price)),
            ProductSort::PriceDesc => found.sort_by(|a, b| b.price.cmp(&a.price)),
        }
        Ok(found)
    }

    fn list_categories(&self) -> Result<Vec<String>> {
        let mut conn = get_connection(&self.pool)?;
        Ok(products::table
            .select(products::category)
            .filter(products::category.ne(""))
            .distinct()
            .order(products::category.asc())
            .load::<String>(&mut conn)
            .map_err(StorageError::from)?)
    }

    async fn upsert_products(&self, products_to_write: Vec<Product>) -> Result<usize> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                upsert_rows(conn, products_to_write)
            })
            .await
    }

    async fn delete_products_except(&self, keep_ids: Vec<String>) -> Result<usize> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                delete_rows_except(conn, &keep_ids)
            })
            .await
    }

    async fn upsert_and_delete_missing(
        &self,
        products_to_write: Vec<Product>,
        keep_ids: Vec<String>,
    ) -> Result<(usize, usize)> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<(usize, usize)> {
                let upserted = upsert_rows(conn, products_to_write)?;
                let deleted = delete_rows_except(conn, &keep_ids)?;
                Ok((upserted, deleted))
            })
            .await
    }
}
