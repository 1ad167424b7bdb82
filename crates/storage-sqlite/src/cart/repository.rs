use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use std::sync::Arc;

use storefront_core::cart::{CartItem, CartLine, CartRepositoryTrait};
use storefront_core::errors::{Error, Result};
use storefront_core::products::Product;

use super::model::{CartItemDB, NewCartItemDB};
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::products::ProductDB;
use crate::schema::{cart_items, products};

pub struct CartRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl CartRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        CartRepository { pool, writer }
    }
}

fn find_line(
    conn: &mut SqliteConnection,
    user_id: &str,
    product_id: &str,
) -> Result<Option<CartItemDB>> {
    Ok(cart_items::table
        .filter(cart_items::user_id.eq(user_id))
        .filter(cart_items::product_id.eq(product_id))
        .select(CartItemDB::as_select())
        .first(conn)
        .optional()
        .map_err(StorageError::from)?)
}

#[async_trait]
impl CartRepositoryTrait for CartRepository {
    fn list_cart_items(&self, user_id: &str) -> Result<Vec<CartItem>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = cart_items::table
            .inner_join(products::table)
            .filter(cart_items::user_id.eq(user_id))
            .order(cart_items::id.asc())
            .select((CartItemDB::as_select(), ProductDB::as_select()))
            .load::<(CartItemDB, ProductDB)>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows
            .into_iter()
            .map(|(line, product)| CartItem {
                line: CartLine::from(line),
                product: Product::from(product),
            })
            .collect())
    }

    fn get_cart_line(&self, user_id: &str, product_id: &str) -> Result<Option<CartLine>> {
        let mut conn = get_connection(&self.pool)?;
        Ok(find_line(&mut conn, user_id, product_id)?.map(CartLine::from))
    }

    async fn add_or_increment(
        &self,
        user_id: String,
        product_id: String,
        quantity: i32,
    ) -> Result<CartLine> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<CartLine> {
                let line = match find_line(conn, &user_id, &product_id)? {
                    Some(existing) => {
                        let total = existing
                            .quantity
                            .checked_add(quantity)
                            .ok_or_else(|| Error::invalid_input("Quantity is out of range"))?;
                        diesel::update(cart_items::table.find(existing.id))
                            .set(cart_items::quantity.eq(total))
                            .returning(CartItemDB::as_returning())
                            .get_result(conn)
                            .map_err(StorageError::from)?
                    }
                    None => diesel::insert_into(cart_items::table)
                        .values(&NewCartItemDB {
                            user_id,
                            product_id,
                            quantity,
                            added_at: Utc::now().to_rfc3339(),
                        })
                        .returning(CartItemDB::as_returning())
                        .get_result(conn)
                        .map_err(StorageError::from)?,
                };
                Ok(CartLine::from(line))
            })
            .await
    }

    async fn set_quantity(
        &self,
        user_id: String,
        product_id: String,
        quantity: i32,
    ) -> Result<CartLine> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<CartLine> {
                let updated = diesel::update(
                    cart_items::table
                        .filter(cart_items::user_id.eq(&user_id))
                        .filter(cart_items::product_id.eq(&product_id)),
                )
                .set(cart_items::quantity.eq(quantity))
                .returning(CartItemDB::as_returning())
                .get_result(conn)
                .optional()
                .map_err(StorageError::from)?;
                updated.map(CartLine::from).ok_or_else(|| {
                    Error::not_found(format!("Cart line for product '{}'", product_id))
                })
            })
            .await
    }

    async fn remove_line(&self, user_id: String, product_id: String) -> Result<usize> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                Ok(diesel::delete(
                    cart_items::table
                        .filter(cart_items::user_id.eq(user_id))
                        .filter(cart_items::product_id.eq(product_id)),
                )
                .execute(conn)
                .map_err(StorageError::from)?)
            })
            .await
    }

    async fn clear_cart(&self, user_id: String) -> Result<usize> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                Ok(
                    diesel::delete(cart_items::table.filter(cart_items::user_id.eq(user_id)))
                        .execute(conn)
                        .map_err(StorageError::from)?,
                )
            })
            .await
    }
}
