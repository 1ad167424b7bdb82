use async_trait::async_trait;
use futures::stream::BoxStream;

use super::{Product, ProductFilter};
use crate::errors::Result;

#[async_trait]
pub trait ProductRepositoryTrait: Send + Sync {
    fn get_product(&self, product_id: &str) -> Result<Option<Product>>;
    fn list_products(&self) -> Result<Vec<Product>>;
    fn search_products(&self, filter: &ProductFilter) -> Result<Vec<Product>>;
    fn list_categories(&self) -> Result<Vec<String>>;

    /// Inserts absent products and overwrites every field of present ones,
    /// keyed by id. Returns the number of rows written.
    async fn upsert_products(&self, products: Vec<Product>) -> Result<usize>;

    /// Deletes every product whose id is not in `keep_ids`.
    async fn delete_products_except(&self, keep_ids: Vec<String>) -> Result<usize>;

    /// `upsert_products` followed by `delete_products_except` as one write:
    /// either both take effect or neither does. Returns `(upserted, deleted)`.
    async fn upsert_and_delete_missing(
        &self,
        products: Vec<Product>,
        keep_ids: Vec<String>,
    ) -> Result<(usize, usize)>;
}

pub trait ProductServiceTrait: Send + Sync {
    fn get_product(&self, product_id: &str) -> Result<Product>;
    fn list_products(&self) -> Result<Vec<Product>>;
    fn search_products(&self, filter: &ProductFilter) -> Result<Vec<Product>>;
    fn list_categories(&self) -> Result<Vec<String>>;
    fn watch_products(&self, filter: ProductFilter) -> BoxStream<'static, Result<Vec<Product>>>;
}
