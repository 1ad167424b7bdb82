//! Throwaway databases for repository tests.

use rust_decimal::Decimal;
use std::sync::Arc;
use tempfile::TempDir;

use storefront_core::products::{Product, ProductRepositoryTrait};
use storefront_core::users::{NewUser, User, UserRepositoryTrait};

use crate::db::{create_pool, init, run_migrations, spawn_writer, DbPool, WriteHandle};
use crate::{ProductRepository, UserRepository};

pub struct TestDb {
    pub pool: Arc<DbPool>,
    pub writer: WriteHandle,
    _dir: TempDir,
}

pub fn setup_db() -> TestDb {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = init(&dir.path().to_string_lossy()).expect("init db");
    run_migrations(&db_path).expect("migrate db");
    let pool = create_pool(&db_path).expect("create pool");
    let writer = spawn_writer(pool.as_ref().clone());
    TestDb {
        pool,
        writer,
        _dir: dir,
    }
}

impl TestDb {
    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone(), self.writer.clone())
    }

    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.pool.clone(), self.writer.clone())
    }

    pub async fn seed_products(&self, products: Vec<Product>) {
        self.products()
            .upsert_products(products)
            .await
            .expect("seed products");
    }

    pub async fn seed_user(&self, email: &str) -> User {
        self.users()
            .create_user(NewUser {
                email: email.to_string(),
                display_name: email.split('@').next().unwrap_or(email).to_string(),
                password_hash: "hash".to_string(),
                is_admin: false,
            })
            .await
            .expect("seed user")
    }
}

pub fn product(id: &str, name: &str, price: Decimal, stock: i64) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        brand: "Acme".to_string(),
        category: "General".to_string(),
        origin: "KR".to_string(),
        price,
        stock,
        image_url: format!("https://cdn.example/{}.png", id),
        description: String::new(),
    }
}
