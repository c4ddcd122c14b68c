//! Estante Domain Concerns

use std::sync::Arc;

use estante::{
    books::Book,
    cart::CartReservation,
    clock::Clock,
    customers::Customer,
    inventory::Inventory,
    orders::Order,
    repository::Repository,
    storage::KeyValueStore,
};
use tokio::sync::Mutex;

use crate::domain::carts::CartLifecycle;

pub mod carts;
pub mod catalog;
pub mod checkout;
pub mod customers;
pub mod inventory;
pub mod orders;
pub mod session;

/// Clock shared by every service.
pub type SharedClock = Arc<dyn Clock + Send + Sync>;

/// Durable store shared by the session and the cart.
pub type SharedStore = Arc<dyn KeyValueStore>;

/// Catalog repository.
pub type Books = Arc<dyn Repository<Book>>;

/// Customer repository.
pub type Customers = Arc<dyn Repository<Customer>>;

/// Order repository.
pub type Orders = Arc<dyn Repository<Order>>;

/// The shopper's reservation engine.
pub type Reservation = CartReservation<SharedStore, SharedClock>;

/// Reservation engine and its countdown, shared by the cart, checkout and
/// the countdown task itself.
pub type SharedCart = Arc<Mutex<CartLifecycle>>;

/// Stock ledger shared by inventory management and exchange receipt.
pub type SharedInventory = Arc<Mutex<Inventory<Books>>>;
