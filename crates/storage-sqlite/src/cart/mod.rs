mod model;
mod repository;

pub use model::{CartItemDB, NewCartItemDB};
pub use repository::CartRepository;
