use async_trait::async_trait;
use futures::stream::BoxStream;
use log::info;
use std::sync::Arc;

use super::{NewOrder, NewOrderLine, Order, OrderRepositoryTrait, OrderServiceTrait, OrderWithLines};
use crate::cart::CartRepositoryTrait;
use crate::errors::{AuthError, Error, Result};
use crate::events::{observe, DomainEvent, DomainEventBus, DomainEventSink};
use crate::users::{User, UserRepositoryTrait};

pub struct OrderService {
    order_repository: Arc<dyn OrderRepositoryTrait>,
    cart_repository: Arc<dyn CartRepositoryTrait>,
    user_repository: Arc<dyn UserRepositoryTrait>,
    event_bus: Arc<DomainEventBus>,
}

impl OrderService {
    pub fn new(
        order_repository: Arc<dyn OrderRepositoryTrait>,
        cart_repository: Arc<dyn CartRepositoryTrait>,
        user_repository: Arc<dyn UserRepositoryTrait>,
        event_bus: Arc<DomainEventBus>,
    ) -> Self {
        Self {
            order_repository,
            cart_repository,
            user_repository,
            event_bus,
        }
    }

    fn load_user(&self, user_id: &str) -> Result<User> {
        self.user_repository
            .get_user(user_id)?
            .ok_or_else(|| Error::not_found(format!("User '{}'", user_id)))
    }
}

#[async_trait]
impl OrderServiceTrait for OrderService {
    async fn checkout(&self, user_id: &str) -> Result<OrderWithLines> {
        let items = self.cart_repository.list_cart_items(user_id)?;
        if items.is_empty() {
            return Err(Error::invalid_input("Cart is empty"));
        }

        let mut lines = Vec::with_capacity(items.len());
        for item in items {
            if i64::from(item.line.quantity) > item.product.stock {
                return Err(Error::invalid_input(format!(
                    "Only {} of '{}' left in stock",
                    item.product.stock, item.product.name
                )));
            }
            lines.push(NewOrderLine {
                product_id: item.product.id,
                product_name: item.product.name,
                quantity: item.line.quantity,
                unit_price: item.product.price,
            });
        }

        let new_order = NewOrder {
            user_id: user_id.to_string(),
            lines,
        };
        new_order.total_amount()?;
        let placed = self.order_repository.place_order(new_order).await?;

        info!(
            "[Checkout] Order {} placed by {} total={}",
            placed.order.id, user_id, placed.order.total_amount
        );
        self.event_bus.emit(DomainEvent::OrdersChanged {
            user_id: user_id.to_string(),
        });
        self.event_bus.emit(DomainEvent::CartChanged {
            user_id: user_id.to_string(),
        });
        Ok(placed)
    }

    fn list_orders(&self, user_id: &str) -> Result<Vec<Order>> {
        self.order_repository.list_orders_for_user(user_id)
    }

    fn list_all_orders(&self, requesting_user_id: &str) -> Result<Vec<Order>> {
        if !self.load_user(requesting_user_id)?.is_admin {
            return Err(AuthError::Forbidden.into());
        }
        self.order_repository.list_all_orders()
    }

    fn get_order(&self, requesting_user_id: &str, order_id: &str) -> Result<OrderWithLines> {
        let order = self
            .order_repository
            .get_order(order_id)?
            .ok_or_else(|| Error::not_found(format!("Order '{}'", order_id)))?;
        if order.order.user_id != requesting_user_id && !self.load_user(requesting_user_id)?.is_admin
        {
            // Other users' orders look absent rather than forbidden.
            return Err(Error::not_found(format!("Order '{}'", order_id)));
        }
        Ok(order)
    }

    fn watch_orders(&self, user_id: &str) -> BoxStream<'static, Result<Vec<Order>>> {
        let repository = Arc::clone(&self.order_repository);
        let owner = user_id.to_string();
        let watched = owner.clone();
        observe(
            &self.event_bus,
            move |event| matches!(event, DomainEvent::OrdersChanged { user_id } if *user_id == watched),
            move || repository.list_orders_for_user(&owner),
        )
    }
}
