use async_trait::async_trait;
use futures::stream::BoxStream;
use std::sync::Arc;

use super::{CartLine, CartRepositoryTrait, CartServiceTrait, CartSummary};
use crate::errors::{Error, Result};
use crate::events::{observe, DomainEvent, DomainEventBus, DomainEventSink};
use crate::products::{Product, ProductRepositoryTrait};

pub struct CartService {
    cart_repository: Arc<dyn CartRepositoryTrait>,
    product_repository: Arc<dyn ProductRepositoryTrait>,
    event_bus: Arc<DomainEventBus>,
}

impl CartService {
    pub fn new(
        cart_repository: Arc<dyn CartRepositoryTrait>,
        product_repository: Arc<dyn ProductRepositoryTrait>,
        event_bus: Arc<DomainEventBus>,
    ) -> Self {
        Self {
            cart_repository,
            product_repository,
            event_bus,
        }
    }

    fn load_product(&self, product_id: &str) -> Result<Product> {
        self.product_repository
            .get_product(product_id)?
            .ok_or_else(|| Error::not_found(format!("Product '{}'", product_id)))
    }

    fn ensure_stock(product: &Product, wanted: i64) -> Result<()> {
        if wanted > product.stock {
            return Err(Error::invalid_input(format!(
                "Only {} of '{}' left in stock",
                product.stock, product.name
            )));
        }
        Ok(())
    }

    fn changed(&self, user_id: &str) {
        self.event_bus.emit(DomainEvent::CartChanged {
            user_id: user_id.to_string(),
        });
    }
}

#[async_trait]
impl CartServiceTrait for CartService {
    async fn add_to_cart(
        &self,
        user_id: &str,
        product_id: &str,
        quantity: i32,
    ) -> Result<CartLine> {
        if quantity < 1 {
            return Err(Error::invalid_input("Quantity must be at least 1"));
        }
        let product = self.load_product(product_id)?;
        let already = self
            .cart_repository
            .get_cart_line(user_id, product_id)?
            .map(|line| i64::from(line.quantity))
            .unwrap_or(0);
        let wanted = already + i64::from(quantity);
        if wanted > i64::from(i32::MAX) {
            return Err(Error::invalid_input("Quantity is out of range"));
        }
        Self::ensure_stock(&product, wanted)?;

        let line = self
            .cart_repository
            .add_or_increment(user_id.to_string(), product_id.to_string(), quantity)
            .await?;
        self.changed(user_id);
        Ok(line)
    }

    async fn update_quantity(
        &self,
        user_id: &str,
        product_id: &str,
        quantity: i32,
    ) -> Result<Option<CartLine>> {
        if quantity < 0 {
            return Err(Error::invalid_input("Quantity must not be negative"));
        }
        if quantity == 0 {
            self.remove_from_cart(user_id, product_id).await?;
            return Ok(None);
        }
        let product = self.load_product(product_id)?;
        Self::ensure_stock(&product, i64::from(quantity))?;

        let line = self
            .cart_repository
            .set_quantity(user_id.to_string(), product_id.to_string(), quantity)
            .await?;
        self.changed(user_id);
        Ok(Some(line))
    }

    async fn remove_from_cart(&self, user_id: &str, product_id: &str) -> Result<()> {
        let removed = self
            .cart_repository
            .remove_line(user_id.to_string(), product_id.to_string())
            .await?;
        if removed > 0 {
            self.changed(user_id);
        }
        Ok(())
    }

    async fn clear_cart(&self, user_id: &str) -> Result<()> {
        let removed = self.cart_repository.clear_cart(user_id.to_string()).await?;
        if removed > 0 {
            self.changed(user_id);
        }
        Ok(())
    }

    fn get_cart(&self, user_id: &str) -> Result<CartSummary> {
        CartSummary::from_items(self.cart_repository.list_cart_items(user_id)?)
    }

    fn watch_cart(&self, user_id: &str) -> BoxStream<'static, Result<CartSummary>> {
        let repository = Arc::clone(&self.cart_repository);
        let owner = user_id.to_string();
        let watched = owner.clone();
        observe(
            &self.event_bus,
            // Product changes move prices and stock under the cart too.
            move |event| match event {
                DomainEvent::CartChanged { user_id } | DomainEvent::OrdersChanged { user_id } => {
                    *user_id == watched
                }
                DomainEvent::ProductsChanged { .. } => true,
                _ => false,
            },
            move || CartSummary::from_items(repository.list_cart_items(&owner)?),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{product, InMemoryStore};
    use futures::StreamExt;
    use rust_decimal_macros::dec;

    fn setup() -> (Arc<InMemoryStore>, Arc<DomainEventBus>, CartService) {
        let store = Arc::new(InMemoryStore::default());
        store.seed_products(vec![
            product("p1", "Phone", dec!(100), 5),
            product("p2", "Case", dec!(12.50), 2),
        ]);
        let bus = Arc::new(DomainEventBus::new());
        let service = CartService::new(store.clone(), store.clone(), bus.clone());
        (store, bus, service)
    }

    #[tokio::test]
    async fn adding_the_same_product_twice_increments_one_line() {
        let (_store, _bus, cart) = setup();
        cart.add_to_cart("u1", "p1", 1).await.unwrap();
        let line = cart.add_to_cart("u1", "p1", 2).await.unwrap();
        assert_eq!(line.quantity, 3);

        let summary = cart.get_cart("u1").unwrap();
        assert_eq!(summary.items.len(), 1);
        assert_eq!(summary.item_count, 3);
        assert_eq!(summary.subtotal, dec!(300));
    }

    #[tokio::test]
    async fn add_rejects_zero_quantity_unknown_product_and_overselling() {
        let (_store, _bus, cart) = setup();
        assert!(cart.add_to_cart("u1", "p1", 0).await.is_err());
        assert!(cart
            .add_to_cart("u1", "ghost", 1)
            .await
            .unwrap_err()
            .is_not_found());

        cart.add_to_cart("u1", "p2", 2).await.unwrap();
        assert!(cart.add_to_cart("u1", "p2", 1).await.is_err());
        assert_eq!(cart.get_cart("u1").unwrap().item_count, 2);
    }

    #[tokio::test]
    async fn quantities_past_the_line_limit_are_rejected() {
        let (store, _bus, cart) = setup();
        store.seed_products(vec![product("p9", "Bolt", dec!(0.01), i64::MAX)]);
        cart.add_to_cart("u1", "p9", 1).await.unwrap();

        let err = cart.add_to_cart("u1", "p9", i32::MAX).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(cart.get_cart("u1").unwrap().item_count, 1);
    }

    #[tokio::test]
    async fn subtotal_out_of_range_is_an_error() {
        let (store, _bus, cart) = setup();
        store.seed_products(vec![product(
            "p9",
            "Yacht",
            rust_decimal::Decimal::MAX / dec!(2) + dec!(1),
            5,
        )]);
        cart.add_to_cart("u1", "p9", 2).await.unwrap();

        assert!(matches!(cart.get_cart("u1"), Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn update_to_zero_removes_the_line() {
        let (_store, _bus, cart) = setup();
        cart.add_to_cart("u1", "p1", 2).await.unwrap();
        cart.add_to_cart("u1", "p2", 1).await.unwrap();

        let updated = cart.update_quantity("u1", "p1", 4).await.unwrap();
        assert_eq!(updated.unwrap().quantity, 4);

        assert!(cart.update_quantity("u1", "p1", 0).await.unwrap().is_none());
        let summary = cart.get_cart("u1").unwrap();
        assert_eq!(summary.items.len(), 1);
        assert_eq!(summary.subtotal, dec!(12.50));
    }

    #[tokio::test]
    async fn carts_are_isolated_per_user() {
        let (_store, _bus, cart) = setup();
        cart.add_to_cart("u1", "p1", 1).await.unwrap();
        cart.add_to_cart("u2", "p2", 1).await.unwrap();
        cart.clear_cart("u1").await.unwrap();

        assert!(cart.get_cart("u1").unwrap().is_empty());
        assert_eq!(cart.get_cart("u2").unwrap().items.len(), 1);
    }

    #[tokio::test]
    async fn watch_cart_ignores_other_users() {
        let (_store, _bus, cart) = setup();
        let mut stream = cart.watch_cart("u1");
        assert!(stream.next().await.unwrap().unwrap().is_empty());

        cart.add_to_cart("u2", "p1", 1).await.unwrap();
        cart.add_to_cart("u1", "p2", 1).await.unwrap();

        let summary = stream.next().await.unwrap().unwrap();
        assert_eq!(summary.items.len(), 1);
        assert_eq!(summary.items[0].product.id, "p2");
    }
}
