//! SQLite storage for the product mirror's persisted state.

pub mod mirror_state;

pub use mirror_state::{MirrorStateDB, MirrorStatusRepository};
