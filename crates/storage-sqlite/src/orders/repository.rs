use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use std::sync::Arc;
use uuid::Uuid;

use storefront_core::orders::{NewOrder, Order, OrderLine, OrderRepositoryTrait, OrderWithLines};
use storefront_core::Result;

use super::model::{NewOrderItemDB, OrderDB, OrderItemDB};
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::{cart_items, order_items, orders};

pub struct OrderRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl OrderRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        OrderRepository { pool, writer }
    }
}

fn load_lines(conn: &mut SqliteConnection, order_id: &str) -> Result<Vec<OrderLine>> {
    let rows = order_items::table
        .filter(order_items::order_id.eq(order_id))
        .order(order_items::id.asc())
        .select(OrderItemDB::as_select())
        .load::<OrderItemDB>(conn)
        .map_err(StorageError::from)?;
    Ok(rows.into_iter().map(OrderLine::from).collect())
}

#[async_trait]
impl OrderRepositoryTrait for OrderRepository {
    async fn place_order(&self, new_order: NewOrder) -> Result<OrderWithLines> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<OrderWithLines> {
                let order_row = OrderDB {
                    // v7 ids sort by creation time, which breaks created_at ties.
                    id: Uuid::now_v7().to_string(),
                    user_id: new_order.user_id.clone(),
                    total_amount: new_order.total_amount()?.to_string(),
                    created_at: Utc::now().to_rfc3339(),
                };
                diesel::insert_into(orders::table)
                    .values(&order_row)
                    .execute(conn)
                    .map_err(StorageError::from)?;

                let item_rows: Vec<NewOrderItemDB> = new_order
                    .lines
                    .into_iter()
                    .map(|line| NewOrderItemDB::from_line(&order_row.id, line))
                    .collect();
                diesel::insert_into(order_items::table)
                    .values(&item_rows)
                    .execute(conn)
                    .map_err(StorageError::from)?;

                diesel::delete(cart_items::table.filter(cart_items::user_id.eq(&new_order.user_id)))
                    .execute(conn)
                    .map_err(StorageError::from)?;

                let lines = load_lines(conn, &order_row.id)?;
                Ok(OrderWithLines {
                    order: Order::from(order_row),
                    lines,
                })
            })
            .await
    }

    fn list_orders_for_user(&self, user_id: &str) -> Result<Vec<Order>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = orders::table
            .filter(orders::user_id.eq(user_id))
            .order((orders::created_at.desc(), orders::id.desc()))
            .load::<OrderDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(Order::from).collect())
    }

    fn list_all_orders(&self) -> Result<Vec<Order>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = orders::table
            .order((orders::created_at.desc(), orders::id.desc()))
            .load::<OrderDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(Order::from).collect())
    }

    fn get_order(&self, order_id: &str) -> Result<Option<OrderWithLines>> {
        let mut conn = get_connection(&self.pool)?;
        let Some(order_row) = orders::table
            .find(order_id)
            .first::<OrderDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?
        else {
            return Ok(None);
        };
        let lines = load_lines(&mut conn, order_id)?;
        Ok(Some(OrderWithLines {
            order: Order::from(order_row),
            lines,
        }))
    }
}
