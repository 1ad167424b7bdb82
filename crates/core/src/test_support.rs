//! In-memory repositories for service tests.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};

use crate::cart::{CartItem, CartLine, CartRepositoryTrait};
use crate::errors::{DatabaseError, Error, Result};
use crate::favorites::FavoriteRepositoryTrait;
use crate::orders::{NewOrder, Order, OrderLine, OrderRepositoryTrait, OrderWithLines};
use crate::products::{Product, ProductFilter, ProductRepositoryTrait, ProductSort};
use crate::settings::SettingsRepositoryTrait;
use crate::sync::{MirrorStatus, MirrorStatusRepositoryTrait};
use crate::users::{NewUser, PasswordHasher, User, UserCredentials, UserRepositoryTrait};

pub fn product(id: &str, name: &str, price: Decimal, stock: i64) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        brand: "Acme".to_string(),
        category: "General".to_string(),
        origin: "KR".to_string(),
        price,
        stock,
        image_url: String::new(),
        description: String::new(),
    }
}

pub fn user(id: &str, is_admin: bool) -> User {
    User {
        id: id.to_string(),
        email: format!("{}@shop.example", id),
        display_name: id.to_string(),
        is_admin,
        created_at: Utc::now().to_rfc3339(),
    }
}

/// Stores the password as-is so tests avoid the cost of Argon2.
pub struct PlainTextHasher;

impl PasswordHasher for PlainTextHasher {
    fn hash(&self, password: &str) -> Result<String> {
        Ok(format!("plain:{}", password))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool> {
        Ok(hash == format!("plain:{}", password))
    }
}

#[derive(Default)]
struct StoreState {
    products: BTreeMap<String, Product>,
    users: BTreeMap<String, UserCredentials>,
    cart: Vec<CartLine>,
    next_cart_id: i32,
    orders: Vec<OrderWithLines>,
    next_order_line_id: i32,
    favorites: BTreeSet<(String, String)>,
    settings: HashMap<String, String>,
    mirror_status: Option<MirrorStatus>,
    fail_product_writes: bool,
}

impl StoreState {
    fn forget_products(&mut self, removed: &[String]) {
        self.cart.retain(|line| !removed.contains(&line.product_id));
        self.favorites
            .retain(|(_, product_id)| !removed.contains(product_id));
    }
}

/// One fake backing every repository trait, with cascades that mirror the
/// SQLite schema.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
}

impl InMemoryStore {
    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap()
    }

    pub fn seed_products(&self, products: Vec<Product>) {
        let mut state = self.state();
        for product in products {
            state.products.insert(product.id.clone(), product);
        }
    }

    pub fn seed_user(&self, user: User) {
        let credentials = UserCredentials {
            password_hash: PlainTextHasher.hash("password").unwrap(),
            user,
        };
        self.state()
            .users
            .insert(credentials.user.id.clone(), credentials);
    }

    /// All products ordered by id.
    pub fn products(&self) -> Vec<Product> {
        self.state().products.values().cloned().collect()
    }

    pub fn fail_product_writes(&self, fail: bool) {
        self.state().fail_product_writes = fail;
    }

    pub fn persisted_mirror_status(&self) -> Option<MirrorStatus> {
        self.state().mirror_status.clone()
    }

    fn remove_products_except(state: &mut StoreState, keep_ids: &[String]) -> usize {
        let keep: BTreeSet<&String> = keep_ids.iter().collect();
        let removed: Vec<String> = state
            .products
            .keys()
            .filter(|id| !keep.contains(id))
            .cloned()
            .collect();
        for id in &removed {
            state.products.remove(id);
        }
        state.forget_products(&removed);
        removed.len()
    }

    fn product_write_guard(state: &StoreState) -> Result<()> {
        if state.fail_product_writes {
            return Err(DatabaseError::QueryFailed("disk I/O error".to_string()).into());
        }
        Ok(())
    }
}

fn matches_filter(product: &Product, filter: &ProductFilter) -> bool {
    if filter.in_stock_only && !product.is_in_stock() {
        return false;
    }
    if let Some(category) = &filter.category {
        if !product.category.eq_ignore_ascii_case(category) {
            return false;
        }
    }
    match &filter.query {
        Some(query) => {
            let needle = query.to_lowercase();
            [&product.name, &product.brand, &product.category]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
        }
        None => true,
    }
}

#[async_trait]
impl ProductRepositoryTrait for InMemoryStore {
    fn get_product(&self, product_id: &str) -> Result<Option<Product>> {
        Ok(self.state().products.get(product_id).cloned())
    }

    fn list_products(&self) -> Result<Vec<Product>> {
        self.search_products(&ProductFilter::default())
    }

    fn search_products(&self, filter: &ProductFilter) -> Result<Vec<Product>> {
        let filter = filter.normalized();
        let mut found: Vec<Product> = self
            .state()
            .products
            .values()
            .filter(|p| matches_filter(p, &filter))
            .cloned()
            .collect();
        match filter.sort {
            ProductSort::NameAsc => found.sort_by(|a, b| a.name.cmp(&b.name)),
            ProductSort::PriceAsc => found.sort_by(|a, b| a.price.cmp(&b.price)),
            ProductSort::PriceDesc => found.sort_by(|a, b| b.price.cmp(&a.price)),
        }
        Ok(found)
    }

    fn list_categories(&self) -> Result<Vec<String>> {
        let categories: BTreeSet<String> = self
            .state()
            .products
            .values()
            .map(|p| p.category.clone())
            .filter(|c| !c.is_empty())
            .collect();
        Ok(categories.into_iter().collect())
    }

    async fn upsert_products(&self, products: Vec<Product>) -> Result<usize> {
        let mut state = self.state();
        Self::product_write_guard(&state)?;
        let count = products.len();
        for product in products {
            state.products.insert(product.id.clone(), product);
        }
        Ok(count)
    }

    async fn delete_products_except(&self, keep_ids: Vec<String>) -> Result<usize> {
        let mut state = self.state();
        Self::product_write_guard(&state)?;
        Ok(Self::remove_products_except(&mut state, &keep_ids))
    }

    async fn upsert_and_delete_missing(
        &self,
        products: Vec<Product>,
        keep_ids: Vec<String>,
    ) -> Result<(usize, usize)> {
        let mut state = self.state();
        Self::product_write_guard(&state)?;
        let upserted = products.len();
        for product in products {
            state.products.insert(product.id.clone(), product);
        }
        Ok((upserted, Self::remove_products_except(&mut state, &keep_ids)))
    }
}

#[async_trait]
impl UserRepositoryTrait for InMemoryStore {
    fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        Ok(self.state().users.get(user_id).map(|c| c.user.clone()))
    }

    fn find_credentials_by_email(&self, email: &str) -> Result<Option<UserCredentials>> {
        let email = email.to_lowercase();
        Ok(self
            .state()
            .users
            .values()
            .find(|c| c.user.email == email)
            .cloned())
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User> {
        let mut state = self.state();
        if state.users.values().any(|c| c.user.email == new_user.email) {
            return Err(DatabaseError::UniqueViolation("users.email".to_string()).into());
        }
        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            email: new_user.email,
            display_name: new_user.display_name,
            is_admin: new_user.is_admin,
            created_at: Utc::now().to_rfc3339(),
        };
        state.users.insert(
            user.id.clone(),
            UserCredentials {
                user: user.clone(),
                password_hash: new_user.password_hash,
            },
        );
        Ok(user)
    }

    async fn update_display_name(&self, user_id: String, display_name: String) -> Result<User> {
        let mut state = self.state();
        let credentials = state
            .users
            .get_mut(&user_id)
            .ok_or_else(|| Error::not_found(format!("User '{}'", user_id)))?;
        credentials.user.display_name = display_name;
        Ok(credentials.user.clone())
    }

    async fn delete_user(&self, user_id: String) -> Result<usize> {
        let mut state = self.state();
        if state.users.remove(&user_id).is_none() {
            return Ok(0);
        }
        state.cart.retain(|line| line.user_id != user_id);
        state.favorites.retain(|(owner, _)| *owner != user_id);
        state.orders.retain(|o| o.order.user_id != user_id);
        Ok(1)
    }
}

#[async_trait]
impl SettingsRepositoryTrait for InMemoryStore {
    fn get_setting(&self, key: &str) -> Result<Option<String>> {
        Ok(self.state().settings.get(key).cloned())
    }

    fn list_settings(&self) -> Result<HashMap<String, String>> {
        Ok(self.state().settings.clone())
    }

    async fn set_setting(&self, key: String, value: String) -> Result<()> {
        self.state().settings.insert(key, value);
        Ok(())
    }

    async fn delete_setting(&self, key: String) -> Result<usize> {
        Ok(usize::from(self.state().settings.remove(&key).is_some()))
    }
}

#[async_trait]
impl CartRepositoryTrait for InMemoryStore {
    fn list_cart_items(&self, user_id: &str) -> Result<Vec<CartItem>> {
        let state = self.state();
        Ok(state
            .cart
            .iter()
            .filter(|line| line.user_id == user_id)
            .filter_map(|line| {
                state.products.get(&line.product_id).map(|p| CartItem {
                    line: line.clone(),
                    product: p.clone(),
                })
            })
            .collect())
    }

    fn get_cart_line(&self, user_id: &str, product_id: &str) -> Result<Option<CartLine>> {
        Ok(self
            .state()
            .cart
            .iter()
            .find(|l| l.user_id == user_id && l.product_id == product_id)
            .cloned())
    }

    async fn add_or_increment(
        &self,
        user_id: String,
        product_id: String,
        quantity: i32,
    ) -> Result<CartLine> {
        let mut state = self.state();
        if !state.products.contains_key(&product_id) {
            return Err(DatabaseError::ForeignKeyViolation("cart_items.product_id".to_string()).into());
        }
        if let Some(line) = state
            .cart
            .iter_mut()
            .find(|l| l.user_id == user_id && l.product_id == product_id)
        {
            line.quantity = line
                .quantity
                .checked_add(quantity)
                .ok_or_else(|| Error::invalid_input("Quantity is out of range"))?;
            return Ok(line.clone());
        }
        state.next_cart_id += 1;
        let line = CartLine {
            id: state.next_cart_id,
            user_id,
            product_id,
            quantity,
            added_at: Utc::now().to_rfc3339(),
        };
        state.cart.push(line.clone());
        Ok(line)
    }

    async fn set_quantity(
        &self,
        user_id: String,
        product_id: String,
        quantity: i32,
    ) -> Result<CartLine> {
        let mut state = self.state();
        let line = state
            .cart
            .iter_mut()
            .find(|l| l.user_id == user_id && l.product_id == product_id)
            .ok_or_else(|| Error::not_found(format!("Cart line for '{}'", product_id)))?;
        line.quantity = quantity;
        Ok(line.clone())
    }

    async fn remove_line(&self, user_id: String, product_id: String) -> Result<usize> {
        let mut state = self.state();
        let before = state.cart.len();
        state
            .cart
            .retain(|l| !(l.user_id == user_id && l.product_id == product_id));
        Ok(before - state.cart.len())
    }

    async fn clear_cart(&self, user_id: String) -> Result<usize> {
        let mut state = self.state();
        let before = state.cart.len();
        state.cart.retain(|l| l.user_id != user_id);
        Ok(before - state.cart.len())
    }
}

#[async_trait]
impl OrderRepositoryTrait for InMemoryStore {
    async fn place_order(&self, new_order: NewOrder) -> Result<OrderWithLines> {
        let mut state = self.state();
        let order = Order {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: new_order.user_id.clone(),
            total_amount: new_order.total_amount()?,
            created_at: Utc::now().to_rfc3339(),
        };
        let mut lines = Vec::with_capacity(new_order.lines.len());
        for line in new_order.lines {
            state.next_order_line_id += 1;
            lines.push(OrderLine {
                id: state.next_order_line_id,
                order_id: order.id.clone(),
                product_id: line.product_id,
                product_name: line.product_name,
                quantity: line.quantity,
                unit_price: line.unit_price,
            });
        }
        let placed = OrderWithLines { order, lines };
        state.orders.push(placed.clone());
        state.cart.retain(|l| l.user_id != new_order.user_id);
        Ok(placed)
    }

    fn list_orders_for_user(&self, user_id: &str) -> Result<Vec<Order>> {
        Ok(self
            .state()
            .orders
            .iter()
            .rev()
            .filter(|o| o.order.user_id == user_id)
            .map(|o| o.order.clone())
            .collect())
    }

    fn list_all_orders(&self) -> Result<Vec<Order>> {
        Ok(self
            .state()
            .orders
            .iter()
            .rev()
            .map(|o| o.order.clone())
            .collect())
    }

    fn get_order(&self, order_id: &str) -> Result<Option<OrderWithLines>> {
        Ok(self
            .state()
            .orders
            .iter()
            .find(|o| o.order.id == order_id)
            .cloned())
    }
}

#[async_trait]
impl FavoriteRepositoryTrait for InMemoryStore {
    async fn add_favorite(&self, user_id: String, product_id: String) -> Result<bool> {
        Ok(self.state().favorites.insert((user_id, product_id)))
    }

    async fn remove_favorite(&self, user_id: String, product_id: String) -> Result<usize> {
        Ok(usize::from(
            self.state().favorites.remove(&(user_id, product_id)),
        ))
    }

    fn is_favorite(&self, user_id: &str, product_id: &str) -> Result<bool> {
        Ok(self
            .state()
            .favorites
            .contains(&(user_id.to_string(), product_id.to_string())))
    }

    fn list_favorite_products(&self, user_id: &str) -> Result<Vec<Product>> {
        let state = self.state();
        Ok(state
            .favorites
            .iter()
            .filter(|(owner, _)| owner == user_id)
            .filter_map(|(_, product_id)| state.products.get(product_id).cloned())
            .collect())
    }
}

#[async_trait]
impl MirrorStatusRepositoryTrait for InMemoryStore {
    fn get_mirror_status(&self) -> Result<Option<MirrorStatus>> {
        Ok(self.state().mirror_status.clone())
    }

    async fn save_mirror_status(&self, status: MirrorStatus) -> Result<()> {
        self.state().mirror_status = Some(status);
        Ok(())
    }
}
