use std::sync::Arc;

use futures::stream::BoxStream;

use super::{Product, ProductFilter, ProductRepositoryTrait, ProductServiceTrait};
use crate::errors::{Error, Result};
use crate::events::{observe, DomainEvent, DomainEventBus};

pub struct ProductService {
    product_repository: Arc<dyn ProductRepositoryTrait>,
    event_bus: Arc<DomainEventBus>,
}

impl ProductService {
    pub fn new(
        product_repository: Arc<dyn ProductRepositoryTrait>,
        event_bus: Arc<DomainEventBus>,
    ) -> Self {
        Self {
            product_repository,
            event_bus,
        }
    }
}

impl ProductServiceTrait for ProductService {
    fn get_product(&self, product_id: &str) -> Result<Product> {
        self.product_repository
            .get_product(product_id)?
            .ok_or_else(|| Error::not_found(format!("Product '{}'", product_id)))
    }

    fn list_products(&self) -> Result<Vec<Product>> {
        self.product_repository.list_products()
    }

    fn search_products(&self, filter: &ProductFilter) -> Result<Vec<Product>> {
        self.product_repository
            .search_products(&filter.normalized())
    }

    fn list_categories(&self) -> Result<Vec<String>> {
        self.product_repository.list_categories()
    }

    fn watch_products(&self, filter: ProductFilter) -> BoxStream<'static, Result<Vec<Product>>> {
        let repository = Arc::clone(&self.product_repository);
        let filter = filter.normalized();
        observe(
            &self.event_bus,
            |event| matches!(event, DomainEvent::ProductsChanged { .. }),
            move || repository.search_products(&filter),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::DomainEventSink;
    use crate::test_support::{product, InMemoryStore};
    use futures::StreamExt;
    use rust_decimal_macros::dec;

    fn service(store: &Arc<InMemoryStore>, bus: &Arc<DomainEventBus>) -> ProductService {
        ProductService::new(store.clone(), bus.clone())
    }

    #[test]
    fn get_product_reports_missing_ids_as_not_found() {
        let store = Arc::new(InMemoryStore::default());
        let bus = Arc::new(DomainEventBus::new());
        let err = service(&store, &bus).get_product("missing").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn search_uses_normalized_filter() {
        let store = Arc::new(InMemoryStore::default());
        store.seed_products(vec![
            product("p1", "Phone", dec!(100), 5),
            product("p2", "Laptop", dec!(900), 0),
        ]);
        let bus = Arc::new(DomainEventBus::new());
        let found = service(&store, &bus)
            .search_products(&ProductFilter {
                query: Some("  phone ".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "p1");
    }

    #[tokio::test]
    async fn watch_products_refreshes_after_products_changed() {
        let store = Arc::new(InMemoryStore::default());
        let bus = Arc::new(DomainEventBus::new());
        let mut stream = service(&store, &bus).watch_products(ProductFilter::default());

        assert!(stream.next().await.unwrap().unwrap().is_empty());

        store.seed_products(vec![product("p1", "Phone", dec!(100), 5)]);
        bus.emit(DomainEvent::ProductsChanged {
            upserted: 1,
            deleted: 0,
        });

        let refreshed = stream.next().await.unwrap().unwrap();
        assert_eq!(refreshed.len(), 1);
        assert_eq!(refreshed[0].price, dec!(100));
    }
}
