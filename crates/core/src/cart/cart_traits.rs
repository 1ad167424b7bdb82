use async_trait::async_trait;
use futures::stream::BoxStream;

use super::{CartItem, CartLine, CartSummary};
use crate::errors::Result;

#[async_trait]
pub trait CartRepositoryTrait: Send + Sync {
    fn list_cart_items(&self, user_id: &str) -> Result<Vec<CartItem>>;
    fn get_cart_line(&self, user_id: &str, product_id: &str) -> Result<Option<CartLine>>;

    /// Inserts a line, or adds `quantity` to the existing line for the same
    /// product.
    async fn add_or_increment(
        &self,
        user_id: String,
        product_id: String,
        quantity: i32,
    ) -> Result<CartLine>;

    async fn set_quantity(
        &self,
        user_id: String,
        product_id: String,
        quantity: i32,
    ) -> Result<CartLine>;

    async fn remove_line(&self, user_id: String, product_id: String) -> Result<usize>;
    async fn clear_cart(&self, user_id: String) -> Result<usize>;
}

#[async_trait]
pub trait CartServiceTrait: Send + Sync {
    async fn add_to_cart(&self, user_id: &str, product_id: &str, quantity: i32)
        -> Result<CartLine>;

    /// Sets an absolute quantity; zero removes the line.
    async fn update_quantity(
        &self,
        user_id: &str,
        product_id: &str,
        quantity: i32,
    ) -> Result<Option<CartLine>>;

    async fn remove_from_cart(&self, user_id: &str, product_id: &str) -> Result<()>;
    async fn clear_cart(&self, user_id: &str) -> Result<()>;
    fn get_cart(&self, user_id: &str) -> Result<CartSummary>;
    fn watch_cart(&self, user_id: &str) -> BoxStream<'static, Result<CartSummary>>;
}
