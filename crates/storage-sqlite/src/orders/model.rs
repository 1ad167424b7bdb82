use diesel::prelude::*;

use storefront_core::orders::{NewOrderLine, Order, OrderLine};

use crate::utils::decimal_from_text;

#[derive(Queryable, Identifiable, Insertable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::orders)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct OrderDB {
    pub id: String,
    pub user_id: String,
    pub total_amount: String,
    pub created_at: String,
}

#[derive(Queryable, Identifiable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::order_items)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct OrderItemDB {
    pub id: i32,
    pub order_id: String,
    pub product_id: String,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: String,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::order_items)]
pub struct NewOrderItemDB {
    pub order_id: String,
    pub product_id: String,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: String,
}

impl NewOrderItemDB {
    pub fn from_line(order_id: &str, line: NewOrderLine) -> Self {
        Self {
            order_id: order_id.to_string(),
            product_id: line.product_id,
            product_name: line.product_name,
            quantity: line.quantity,
            unit_price: line.unit_price.to_string(),
        }
    }
}

impl From<OrderDB> for Order {
    fn from(db: OrderDB) -> Self {
        Self {
            total_amount: decimal_from_text("orders.total_amount", &db.total_amount),
            id: db.id,
            user_id: db.user_id,
            created_at: db.created_at,
        }
    }
}

impl From<OrderItemDB> for OrderLine {
    fn from(db: OrderItemDB) -> Self {
        Self {
            unit_price: decimal_from_text("order_items.unit_price", &db.unit_price),
            id: db.id,
            order_id: db.order_id,
            product_id: db.product_id,
            product_name: db.product_name,
            quantity: db.quantity,
        }
    }
}
