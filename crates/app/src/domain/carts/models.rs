//! Cart Models

use estante::{
    cart::{Cart, CartReservation},
    clock::Clock,
    storage::KeyValueStore,
};

/// What the shopper sees of their reservation.
#[derive(Debug, Clone, PartialEq)]
pub struct CartView {
    pub cart: Option<Cart>,
    pub total: u64,
    pub items_count: u32,
    pub remaining_seconds: u64,
    pub expiring_soon: bool,
}

impl CartView {
    /// Snapshot the engine's current state.
    pub fn of<S: KeyValueStore, C: Clock>(engine: &CartReservation<S, C>) -> Self {
        Self {
            cart: engine.cart().cloned(),
            total: engine.total(),
            items_count: engine.items_count(),
            remaining_seconds: engine.remaining_seconds(),
            expiring_soon: engine.is_expiring_soon(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cart.is_none()
    }
}
