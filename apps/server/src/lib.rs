//! Headless storefront process: configuration, service wiring and the
//! product mirror lifecycle.

pub mod config;
pub mod context;
