//! SQLite storage for the storefront: diesel schema, migrations, the write
//! actor and one repository per core repository trait.

pub mod cart;
pub mod db;
pub mod errors;
pub mod favorites;
pub mod orders;
pub mod products;
pub mod schema;
pub mod settings;
pub mod sync;
pub mod users;

mod utils;

pub use cart::CartRepository;
pub use errors::StorageError;
pub use favorites::FavoriteRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use settings::SettingsRepository;
pub use sync::MirrorStatusRepository;
pub use users::UserRepository;

#[cfg(test)]
pub(crate) mod test_utils;
