//! Persisted cart snapshots
//!
//! The snapshot is the cart serialized as JSON:
//! `{"items":[{"bookId","book","quantity","price","addedAt"}],"expiresAt"}`.

use jiff::Timestamp;

use super::Cart;

/// What was found under the cart key.
#[derive(Debug, Clone, PartialEq)]
pub enum Restored {
    /// A live cart.
    Live(Cart),

    /// A well-formed cart whose reservation already lapsed.
    Expired,

    /// Unparseable data, or a cart with no lines.
    Corrupt,
}

/// Serialize a cart for storage.
///
/// # Errors
///
/// Returns a [`serde_json::Error`] if serialization fails.
pub fn encode(cart: &Cart) -> Result<String, serde_json::Error> {
    serde_json::to_string(cart)
}

/// Interpret a stored snapshot at `now`.
pub fn decode(raw: &str, now: Timestamp) -> Restored {
    match serde_json::from_str::<Cart>(raw) {
        Ok(cart) if cart.items.is_empty() || cart.items.iter().any(|i| i.quantity == 0) => {
            Restored::Corrupt
        }
        Ok(cart) if cart.is_expired(now) => Restored::Expired,
        Ok(cart) => Restored::Live(cart),
        Err(_) => Restored::Corrupt,
    }
}
