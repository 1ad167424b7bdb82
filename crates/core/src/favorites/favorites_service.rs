use async_trait::async_trait;
use futures::stream::BoxStream;
use std::sync::Arc;

use super::{FavoriteRepositoryTrait, FavoriteServiceTrait};
use crate::errors::{Error, Result};
use crate::events::{observe, DomainEvent, DomainEventBus, DomainEventSink};
use crate::products::{Product, ProductRepositoryTrait};

pub struct FavoriteService {
    favorite_repository: Arc<dyn FavoriteRepositoryTrait>,
    product_repository: Arc<dyn ProductRepositoryTrait>,
    event_bus: Arc<DomainEventBus>,
}

impl FavoriteService {
    pub fn new(
        favorite_repository: Arc<dyn FavoriteRepositoryTrait>,
        product_repository: Arc<dyn ProductRepositoryTrait>,
        event_bus: Arc<DomainEventBus>,
    ) -> Self {
        Self {
            favorite_repository,
            product_repository,
            event_bus,
        }
    }

    fn changed(&self, user_id: &str) {
        self.event_bus.emit(DomainEvent::FavoritesChanged {
            user_id: user_id.to_string(),
        });
    }
}

#[async_trait]
impl FavoriteServiceTrait for FavoriteService {
    async fn add(&self, user_id: &str, product_id: &str) -> Result<()> {
        if self.product_repository.get_product(product_id)?.is_none() {
            return Err(Error::not_found(format!("Product '{}'", product_id)));
        }
        let inserted = self
            .favorite_repository
            .add_favorite(user_id.to_string(), product_id.to_string())
            .await?;
        if inserted {
            self.changed(user_id);
        }
        Ok(())
    }

    async fn remove(&self, user_id: &str, product_id: &str) -> Result<()> {
        let removed = self
            .favorite_repository
            .remove_favorite(user_id.to_string(), product_id.to_string())
            .await?;
        if removed > 0 {
            self.changed(user_id);
        }
        Ok(())
    }

    async fn toggle(&self, user_id: &str, product_id: &str) -> Result<bool> {
        if self.favorite_repository.is_favorite(user_id, product_id)? {
            self.remove(user_id, product_id).await?;
            Ok(false)
        } else {
            self.add(user_id, product_id).await?;
            Ok(true)
        }
    }

    fn is_favorite(&self, user_id: &str, product_id: &str) -> Result<bool> {
        self.favorite_repository.is_favorite(user_id, product_id)
    }

    fn list_favorites(&self, user_id: &str) -> Result<Vec<Product>> {
        self.favorite_repository.list_favorite_products(user_id)
    }

    fn watch_favorites(&self, user_id: &str) -> BoxStream<'static, Result<Vec<Product>>> {
        let repository = Arc::clone(&self.favorite_repository);
        let owner = user_id.to_string();
        let watched = owner.clone();
        observe(
            &self.event_bus,
            move |event| match event {
                DomainEvent::FavoritesChanged { user_id } => *user_id == watched,
                DomainEvent::ProductsChanged { .. } => true,
                _ => false,
            },
            move || repository.list_favorite_products(&owner),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{product, InMemoryStore};
    use futures::StreamExt;
    use rust_decimal_macros::dec;

    fn setup() -> FavoriteService {
        let store = Arc::new(InMemoryStore::default());
        store.seed_products(vec![
            product("p1", "Phone", dec!(100), 5),
            product("p2", "Case", dec!(12.50), 10),
        ]);
        FavoriteService::new(store.clone(), store, Arc::new(DomainEventBus::new()))
    }

    #[tokio::test]
    async fn toggle_flips_membership() {
        let favorites = setup();
        assert!(favorites.toggle("u1", "p1").await.unwrap());
        assert!(favorites.is_favorite("u1", "p1").unwrap());
        assert!(!favorites.toggle("u1", "p1").await.unwrap());
        assert!(!favorites.is_favorite("u1", "p1").unwrap());
    }

    #[tokio::test]
    async fn adding_twice_keeps_a_single_membership() {
        let favorites = setup();
        favorites.add("u1", "p2").await.unwrap();
        favorites.add("u1", "p2").await.unwrap();
        assert_eq!(favorites.list_favorites("u1").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_products_cannot_be_favorited() {
        let favorites = setup();
        assert!(favorites
            .add("u1", "ghost")
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn watch_favorites_follows_changes() {
        let favorites = setup();
        let mut stream = favorites.watch_favorites("u1");
        assert!(stream.next().await.unwrap().unwrap().is_empty());

        favorites.add("u1", "p1").await.unwrap();
        let listed = stream.next().await.unwrap().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, "p1");
    }
}
