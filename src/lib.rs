//! Estante
//!
//! Estante is the storefront engine of an online bookstore: a time-bounded
//! cart reservation over a catalog with stock limits, an order and exchange
//! state machine, and checkout payment aggregation.

pub mod books;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod clock;
pub mod customers;
pub mod fixtures;
pub mod ids;
pub mod inventory;
pub mod money;
pub mod orders;
pub mod prelude;
pub mod repository;
pub mod storage;
pub mod validation;
