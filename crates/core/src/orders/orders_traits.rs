use async_trait::async_trait;
use futures::stream::BoxStream;

use super::{NewOrder, Order, OrderWithLines};
use crate::errors::Result;

#[async_trait]
pub trait OrderRepositoryTrait: Send + Sync {
    /// Writes the order and its lines and empties the buyer's cart, all in
    /// one transaction.
    async fn place_order(&self, new_order: NewOrder) -> Result<OrderWithLines>;

    /// Newest first.
    fn list_orders_for_user(&self, user_id: &str) -> Result<Vec<Order>>;
    fn list_all_orders(&self) -> Result<Vec<Order>>;
    fn get_order(&self, order_id: &str) -> Result<Option<OrderWithLines>>;
}

#[async_trait]
pub trait OrderServiceTrait: Send + Sync {
    async fn checkout(&self, user_id: &str) -> Result<OrderWithLines>;
    fn list_orders(&self, user_id: &str) -> Result<Vec<Order>>;

    /// Every order in the store; admin accounts only.
    fn list_all_orders(&self, requesting_user_id: &str) -> Result<Vec<Order>>;

    /// Visible to the owner and to admins.
    fn get_order(&self, requesting_user_id: &str, order_id: &str) -> Result<OrderWithLines>;
    fn watch_orders(&self, user_id: &str) -> BoxStream<'static, Result<Vec<Order>>>;
}
