//! Carts

pub mod errors;
pub mod models;
pub mod service;
pub mod ticker;

pub use errors::CartsServiceError;
pub use service::*;
pub use ticker::{CartLifecycle, TICK_PERIOD};
