//! Wires storage, services and the product mirror into one context.

use std::sync::Arc;

use anyhow::Context as _;
use storefront_core::{
    cart, events::DomainEventBus, favorites, orders, products, settings,
    sync::{MirrorHandle, MirrorStatusRepositoryTrait, ProductMirror, RemoteProductSource},
    users,
};
use storefront_remote_catalog::{PollingProductSource, RemoteCatalogClient};
use storefront_storage_sqlite::{
    db, CartRepository, FavoriteRepository, MirrorStatusRepository, OrderRepository,
    ProductRepository, SettingsRepository, UserRepository,
};
use tracing::info;

use crate::config::ServerConfig;

pub struct ServiceContext {
    pub db_path: String,

    /// Every service emits onto this bus; observers subscribe to it.
    pub event_bus: Arc<DomainEventBus>,

    pub product_service: Arc<dyn products::ProductServiceTrait>,
    pub auth_service: Arc<dyn users::AuthServiceTrait>,
    pub cart_service: Arc<dyn cart::CartServiceTrait>,
    pub order_service: Arc<dyn orders::OrderServiceTrait>,
    pub favorite_service: Arc<dyn favorites::FavoriteServiceTrait>,
    pub settings_service: Arc<dyn settings::SettingsServiceTrait>,

    pub mirror_status_repository: Arc<dyn MirrorStatusRepositoryTrait>,
    mirror: Option<ProductMirror>,
}

impl ServiceContext {
    pub fn product_service(&self) -> Arc<dyn products::ProductServiceTrait> {
        Arc::clone(&self.product_service)
    }

    pub fn auth_service(&self) -> Arc<dyn users::AuthServiceTrait> {
        Arc::clone(&self.auth_service)
    }

    pub fn cart_service(&self) -> Arc<dyn cart::CartServiceTrait> {
        Arc::clone(&self.cart_service)
    }

    pub fn order_service(&self) -> Arc<dyn orders::OrderServiceTrait> {
        Arc::clone(&self.order_service)
    }

    pub fn favorite_service(&self) -> Arc<dyn favorites::FavoriteServiceTrait> {
        Arc::clone(&self.favorite_service)
    }

    pub fn settings_service(&self) -> Arc<dyn settings::SettingsServiceTrait> {
        Arc::clone(&self.settings_service)
    }

    /// Starts the product mirror. Only the first call has an effect.
    pub fn start_mirror(&mut self) -> Option<MirrorHandle> {
        self.mirror.take().map(ProductMirror::start)
    }
}

/// Opens the database, applies migrations and builds every service around
/// a single writer and event bus. The mirror is built but not started.
pub fn initialize_context(config: &ServerConfig) -> anyhow::Result<ServiceContext> {
    let source = PollingProductSource::new(
        RemoteCatalogClient::new(&config.remote_url, config.remote_api_key.clone())
            .context("Failed to build remote catalog client")?,
        config.products_collection.clone(),
    )
    .with_interval(config.poll_interval);
    build_context(config, Arc::new(source))
}

pub fn build_context(
    config: &ServerConfig,
    source: Arc<dyn RemoteProductSource>,
) -> anyhow::Result<ServiceContext> {
    let db_path = db::init(&config.data_dir).context("Failed to initialize database")?;
    db::run_migrations(&db_path).context("Failed to run migrations")?;
    let pool = db::create_pool(&db_path).context("Failed to create connection pool")?;
    let writer = db::spawn_writer(pool.as_ref().clone());
    info!("Database ready at {}", db_path);

    let event_bus = Arc::new(DomainEventBus::new());

    let product_repository = Arc::new(ProductRepository::new(pool.clone(), writer.clone()));
    let user_repository = Arc::new(UserRepository::new(pool.clone(), writer.clone()));
    let cart_repository = Arc::new(CartRepository::new(pool.clone(), writer.clone()));
    let order_repository = Arc::new(OrderRepository::new(pool.clone(), writer.clone()));
    let favorite_repository = Arc::new(FavoriteRepository::new(pool.clone(), writer.clone()));
    let settings_repository = Arc::new(SettingsRepository::new(pool.clone(), writer.clone()));
    let mirror_status_repository: Arc<dyn MirrorStatusRepositoryTrait> =
        Arc::new(MirrorStatusRepository::new(pool, writer));

    let settings_service: Arc<dyn settings::SettingsServiceTrait> = Arc::new(
        settings::SettingsService::new(settings_repository).with_event_sink(event_bus.clone()),
    );
    let product_service = Arc::new(products::ProductService::new(
        product_repository.clone(),
        event_bus.clone(),
    ));
    let auth_service = Arc::new(users::AuthService::new(
        user_repository.clone(),
        settings_service.clone(),
        Arc::new(users::Argon2PasswordHasher),
    ));
    let cart_service = Arc::new(cart::CartService::new(
        cart_repository.clone(),
        product_repository.clone(),
        event_bus.clone(),
    ));
    let order_service = Arc::new(orders::OrderService::new(
        order_repository,
        cart_repository,
        user_repository,
        event_bus.clone(),
    ));
    let favorite_service = Arc::new(favorites::FavoriteService::new(
        favorite_repository,
        product_repository.clone(),
        event_bus.clone(),
    ));

    let mirror = ProductMirror::new(
        source,
        product_repository,
        mirror_status_repository.clone(),
        config.mirror.clone(),
    )
    .with_event_sink(event_bus.clone());

    Ok(ServiceContext {
        db_path,
        event_bus,
        product_service,
        auth_service,
        cart_service,
        order_service,
        favorite_service,
        settings_service,
        mirror_status_repository,
        mirror: Some(mirror),
    })
}
