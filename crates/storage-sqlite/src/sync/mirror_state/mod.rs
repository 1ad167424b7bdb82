mod model;
mod repository;

pub use model::MirrorStateDB;
pub use repository::MirrorStatusRepository;
