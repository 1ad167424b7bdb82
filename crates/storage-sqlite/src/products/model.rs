//! Database model for catalog rows.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use storefront_core::products::Product;

use crate::utils::decimal_from_text;

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
#[diesel(table_name = crate::schema::products)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ProductDB {
    pub id: String,
    pub name: String,
    pub brand: String,
    pub category: String,
    pub origin: String,
    pub price: String,
    pub stock: i64,
    pub image_url: String,
    pub description: String,
    pub updated_at: String,
}

impl ProductDB {
    pub fn from_domain(product: Product, updated_at: &str) -> Self {
        Self {
            id: product.id,
            name: product.name,
            brand: product.brand,
            category: product.category,
            origin: product.origin,
            price: product.price.to_string(),
            stock: product.stock,
            image_url: product.image_url,
            description: product.description,
            updated_at: updated_at.to_string(),
        }
    }
}

impl From<ProductDB> for Product {
    fn from(db: ProductDB) -> Self {
        Self {
            price: decimal_from_text("products.price", &db.price),
            id: db.id,
            name: db.name,
            brand: db.brand,
            category: db.category,
            origin: db.origin,
            stock: db.stock,
            image_url: db.image_url,
            description: db.description,
        }
    }
}
