//! Session

pub mod errors;
pub mod models;
pub mod service;

pub use errors::AuthError;
pub use service::*;
