use diesel::prelude::*;

use storefront_core::cart::CartLine;

#[derive(Queryable, Identifiable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::cart_items)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CartItemDB {
    pub id: i32,
    pub user_id: String,
    pub product_id: String,
    pub quantity: i32,
    pub added_at: String,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::cart_items)]
pub struct NewCartItemDB {
    pub user_id: String,
    pub product_id: String,
    pub quantity: i32,
    pub added_at: String,
}

impl From<CartItemDB> for CartLine {
    fn from(db: CartItemDB) -> Self {
        Self {
            id: db.id,
            user_id: db.user_id,
            product_id: db.product_id,
            quantity: db.quantity,
            added_at: db.added_at,
        }
    }
}
