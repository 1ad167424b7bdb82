mod model;
mod repository;

pub use model::FavoriteDB;
pub use repository::FavoriteRepository;
