//! One-way mirror of the remote product collection into local storage.

mod mirror_decode;
mod mirror_model;
mod mirror_policy;
mod mirror_scheduler;
mod mirror_source;
mod mirror_traits;
mod product_mirror;

pub use mirror_decode::*;
pub use mirror_model::*;
pub use mirror_policy::*;
pub use mirror_scheduler::*;
pub use mirror_source::*;
pub use mirror_traits::*;
pub use product_mirror::*;
