//! Customers

pub mod errors;
pub mod service;

pub use errors::CustomersServiceError;
pub use service::*;
