mod model;
mod repository;

pub use model::{NewOrderItemDB, OrderDB, OrderItemDB};
pub use repository::OrderRepository;
