use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::errors::Result;
use crate::products::Product;

#[async_trait]
pub trait FavoriteRepositoryTrait: Send + Sync {
    /// Returns `false` when the pair was already present.
    async fn add_favorite(&self, user_id: String, product_id: String) -> Result<bool>;
    async fn remove_favorite(&self, user_id: String, product_id: String) -> Result<usize>;
    fn is_favorite(&self, user_id: &str, product_id: &str) -> Result<bool>;
    fn list_favorite_products(&self, user_id: &str) -> Result<Vec<Product>>;
}

#[async_trait]
pub trait FavoriteServiceTrait: Send + Sync {
    async fn add(&self, user_id: &str, product_id: &str) -> Result<()>;
    async fn remove(&self, user_id: &str, product_id: &str) -> Result<()>;

    /// Flips membership and returns the new state.
    async fn toggle(&self, user_id: &str, product_id: &str) -> Result<bool>;
    fn is_favorite(&self, user_id: &str, product_id: &str) -> Result<bool>;
    fn list_favorites(&self, user_id: &str) -> Result<Vec<Product>>;
    fn watch_favorites(&self, user_id: &str) -> BoxStream<'static, Result<Vec<Product>>>;
}
