//! Cart
//!
//! A cart is a set of line items sharing one expiry instant. There is no such
//! thing as an empty cart: removing the last line, clearing, or letting the
//! reservation lapse all leave the shopper with no cart at all, which the
//! engine models as `Option<Cart>`.

use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    books::{Book, BookUuid},
    money,
};

pub mod reservation;
pub mod snapshot;

pub use reservation::{CartReservation, TickOutcome};

/// How long a cart is held after its last touch.
pub const CART_TTL: SignedDuration = SignedDuration::from_mins(15);

/// Remaining time below which the shopper should be warned.
pub const EXPIRY_WARNING: SignedDuration = SignedDuration::from_mins(5);

/// Cart mutation errors. None of these change the cart.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CartError {
    /// Quantities added must be at least one.
    #[error("quantity must be at least 1")]
    InvalidQuantity(BookUuid),

    /// The resulting line quantity would exceed the book's stock.
    #[error("only {available} in stock for {book}, {requested} requested")]
    StockExceeded {
        /// Book
        book: BookUuid,

        /// Resulting line quantity that was refused.
        requested: u32,

        /// Stock at the time of the request.
        available: u32,
    },

    /// The book is not for sale.
    #[error("book {0} is not available")]
    Unavailable(BookUuid),

    /// The book is not in the cart.
    #[error("book {0} is not in the cart")]
    ItemNotFound(BookUuid),
}

/// One book and quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Book
    pub book_id: BookUuid,

    /// Catalog entry as it was when first added.
    pub book: Book,

    /// Units, always at least one.
    pub quantity: u32,

    /// Unit price in centavos, frozen when first added.
    pub price: u64,

    /// When the line was created.
    pub added_at: Timestamp,
}

impl CartItem {
    /// `price * quantity`.
    pub fn subtotal(&self) -> u64 {
        money::line_total(self.price, self.quantity)
    }
}

/// A non-empty set of line items with a shared expiry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    /// Lines, in insertion order.
    pub items: Vec<CartItem>,

    /// When the whole cart lapses.
    pub expires_at: Timestamp,
}

impl Cart {
    /// Sum of line subtotals.
    pub fn total(&self) -> u64 {
        money::sum(self.items.iter().map(CartItem::subtotal))
    }

    /// Sum of quantities.
    pub fn items_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0, |count, item| count.saturating_add(item.quantity))
    }

    /// Line for `book_id`, if present.
    pub fn item(&self, book_id: BookUuid) -> Option<&CartItem> {
        self.items.iter().find(|item| item.book_id == book_id)
    }

    /// Time left before the cart lapses, never negative.
    pub fn remaining(&self, now: Timestamp) -> SignedDuration {
        now.duration_until(self.expires_at).max(SignedDuration::ZERO)
    }

    /// Whether the reservation has lapsed at `now`.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expires_at <= now
    }
}

/// Whole seconds left, rounded up.
pub fn ceil_seconds(remaining: SignedDuration) -> u64 {
    let millis = u64::try_from(remaining.as_millis()).unwrap_or(0);

    millis.div_ceil(1000)
}
