//! Cart reservation engine

use jiff::{SignedDuration, Timestamp};
use tracing::{debug, info, warn};

use crate::{
    books::{Book, BookUuid},
    cart::{
        CART_TTL, Cart, CartError, CartItem, EXPIRY_WARNING, ceil_seconds,
        snapshot::{self, Restored},
    },
    clock::Clock,
    storage::{CART_KEY, KeyValueStore},
};

/// Result of one expiry tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// There is no cart, so nothing to count down.
    Idle,

    /// The cart is still held.
    Active {
        /// Whole seconds left, rounded up.
        remaining_seconds: u64,
    },

    /// The cart lapsed on this tick and was cleared.
    Expired,
}

/// Owns the shopper's cart, its expiry, and its persisted snapshot.
///
/// Every change writes a full snapshot to the store (or removes it once the
/// cart is gone). Storage failures are logged and otherwise ignored: the
/// in-memory cart stays authoritative.
#[derive(Debug)]
pub struct CartReservation<S, C> {
    store: S,
    clock: C,
    ttl: SignedDuration,
    cart: Option<Cart>,
}

impl<S: KeyValueStore, C: Clock> CartReservation<S, C> {
    /// An engine with no cart and the standard TTL.
    pub fn new(store: S, clock: C) -> Self {
        Self {
            store,
            clock,
            ttl: CART_TTL,
            cart: None,
        }
    }

    /// Override the reservation window.
    #[must_use]
    pub fn with_ttl(mut self, ttl: SignedDuration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Rehydrate the cart from storage.
    ///
    /// Expired or unreadable snapshots are purged and leave no cart.
    pub fn restore(&mut self) -> Option<&Cart> {
        let raw = match self.store.get(CART_KEY) {
            Ok(raw) => raw,
            Err(error) if error.is_unreadable() => {
                warn!(%error, "discarding unreadable cart snapshot");
                self.discard_snapshot();
                None
            }
            Err(error) => {
                warn!(%error, "could not read cart snapshot");
                None
            }
        };

        self.cart = match raw.map(|raw| snapshot::decode(&raw, self.clock.now())) {
            Some(Restored::Live(cart)) => {
                debug!(lines = cart.items.len(), "restored cart");
                Some(cart)
            }
            Some(Restored::Expired) => {
                info!("discarding expired cart snapshot");
                self.discard_snapshot();
                None
            }
            Some(Restored::Corrupt) => {
                warn!("discarding corrupt cart snapshot");
                self.discard_snapshot();
                None
            }
            None => None,
        };

        self.cart.as_ref()
    }

    /// Current cart, if any.
    pub fn cart(&self) -> Option<&Cart> {
        self.cart.as_ref()
    }

    /// Reservation window.
    pub fn ttl(&self) -> SignedDuration {
        self.ttl
    }

    /// Add `quantity` copies of `book`, creating the cart if needed.
    ///
    /// The unit price and book snapshot are frozen on the first add; later
    /// adds only raise the quantity. Every successful add resets the expiry.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] and leaves the cart untouched if `quantity`
    /// is zero, the book is inactive, or the resulting line would exceed the
    /// book's stock.
    pub fn add_to_cart(&mut self, book: &Book, quantity: u32) -> Result<(), CartError> {
        let now = self.clock.now();

        self.evict_if_expired(now);

        if quantity == 0 {
            return Err(CartError::InvalidQuantity(book.uuid));
        }

        if !book.is_active() {
            return Err(CartError::Unavailable(book.uuid));
        }

        let existing = self
            .cart
            .as_ref()
            .and_then(|cart| cart.item(book.uuid))
            .map_or(0, |item| item.quantity);

        let requested = existing.saturating_add(quantity);

        if requested > book.stock {
            debug!(book = %book.uuid, requested, available = book.stock, "add rejected");

            return Err(CartError::StockExceeded {
                book: book.uuid,
                requested,
                available: book.stock,
            });
        }

        let expires_at = expiry(now, self.ttl);

        let line = CartItem {
            book_id: book.uuid,
            book: book.clone(),
            quantity,
            price: book.price,
            added_at: now,
        };

        match &mut self.cart {
            Some(cart) => {
                match cart.items.iter_mut().find(|item| item.book_id == book.uuid) {
                    Some(item) => item.quantity = requested,
                    None => cart.items.push(line),
                }

                cart.expires_at = expires_at;
            }
            None => {
                self.cart = Some(Cart {
                    items: vec![line],
                    expires_at,
                });
            }
        }

        debug!(book = %book.uuid, quantity = requested, %expires_at, "added to cart");

        self.persist();

        Ok(())
    }

    /// Remove a line. Removing the last line drops the cart. Does not touch
    /// the expiry.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ItemNotFound`] if the book is not in the cart.
    pub fn remove_from_cart(&mut self, book_id: BookUuid) -> Result<(), CartError> {
        self.evict_if_expired(self.clock.now());

        let cart = self
            .cart
            .as_mut()
            .ok_or(CartError::ItemNotFound(book_id))?;

        let before = cart.items.len();

        cart.items.retain(|item| item.book_id != book_id);

        if cart.items.len() == before {
            return Err(CartError::ItemNotFound(book_id));
        }

        if cart.items.is_empty() {
            self.cart = None;
        }

        debug!(book = %book_id, "removed from cart");

        self.persist();

        Ok(())
    }

    /// Set a line's quantity. Zero removes the line.
    ///
    /// The bound is the stock recorded on the line's book snapshot; call
    /// [`Self::refresh_book`] first to check against live stock. Raising the
    /// quantity resets the expiry, lowering it does not.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ItemNotFound`] for an unknown line and
    /// [`CartError::StockExceeded`] (line unchanged) when over stock.
    pub fn update_quantity(&mut self, book_id: BookUuid, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return self.remove_from_cart(book_id);
        }

        let now = self.clock.now();

        self.evict_if_expired(now);

        let expires_at = expiry(now, self.ttl);

        let cart = self
            .cart
            .as_mut()
            .ok_or(CartError::ItemNotFound(book_id))?;

        let item = cart
            .items
            .iter_mut()
            .find(|item| item.book_id == book_id)
            .ok_or(CartError::ItemNotFound(book_id))?;

        if quantity > item.book.stock {
            return Err(CartError::StockExceeded {
                book: book_id,
                requested: quantity,
                available: item.book.stock,
            });
        }

        let increased = quantity > item.quantity;

        item.quantity = quantity;

        if increased {
            cart.expires_at = expires_at;
        }

        debug!(book = %book_id, quantity, "updated cart quantity");

        self.persist();

        Ok(())
    }

    /// Replace a line's book snapshot with the current catalog entry so stock
    /// checks see live numbers. The frozen price is kept.
    ///
    /// Returns whether a line was refreshed.
    pub fn refresh_book(&mut self, book: &Book) -> bool {
        let Some(item) = self
            .cart
            .as_mut()
            .and_then(|cart| cart.items.iter_mut().find(|item| item.book_id == book.uuid))
        else {
            return false;
        };

        item.book = book.clone();

        self.persist();

        true
    }

    /// Drop the cart.
    pub fn clear(&mut self) {
        if self.cart.take().is_some() {
            debug!("cleared cart");
        }

        self.persist();
    }

    /// Run `f` against the current cart and drop the cart only if it succeeds.
    ///
    /// # Errors
    ///
    /// Propagates `f`'s error, in which case the cart is left as it was.
    pub fn consume<T, E>(&mut self, f: impl FnOnce(Option<&Cart>) -> Result<T, E>) -> Result<T, E> {
        self.evict_if_expired(self.clock.now());

        let value = f(self.cart.as_ref())?;

        self.clear();

        Ok(value)
    }

    /// Sum of `price * quantity`; zero with no cart.
    pub fn total(&self) -> u64 {
        self.cart.as_ref().map_or(0, Cart::total)
    }

    /// Sum of quantities; zero with no cart.
    pub fn items_count(&self) -> u32 {
        self.cart.as_ref().map_or(0, Cart::items_count)
    }

    /// Whether `book_id` has a line.
    pub fn contains(&self, book_id: BookUuid) -> bool {
        self.cart
            .as_ref()
            .is_some_and(|cart| cart.item(book_id).is_some())
    }

    /// Time left on the reservation.
    pub fn remaining(&self) -> Option<SignedDuration> {
        let now = self.clock.now();

        self.cart.as_ref().map(|cart| cart.remaining(now))
    }

    /// Whole seconds left, rounded up; zero with no cart.
    pub fn remaining_seconds(&self) -> u64 {
        self.remaining().map_or(0, ceil_seconds)
    }

    /// Whether the shopper should be warned about the reservation lapsing.
    pub fn is_expiring_soon(&self) -> bool {
        self.remaining()
            .is_some_and(|remaining| remaining <= EXPIRY_WARNING)
    }

    /// Advance the countdown, clearing the cart once it has lapsed.
    pub fn tick(&mut self) -> TickOutcome {
        let now = self.clock.now();

        let Some(cart) = &self.cart else {
            return TickOutcome::Idle;
        };

        if !cart.is_expired(now) {
            return TickOutcome::Active {
                remaining_seconds: ceil_seconds(cart.remaining(now)),
            };
        }

        info!(expires_at = %cart.expires_at, "cart reservation expired");

        self.cart = None;
        self.persist();

        TickOutcome::Expired
    }

    fn evict_if_expired(&mut self, now: Timestamp) {
        if self.cart.as_ref().is_some_and(|cart| cart.is_expired(now)) {
            info!("cart reservation expired");

            self.cart = None;
            self.persist();
        }
    }

    fn persist(&self) {
        let result = match &self.cart {
            Some(cart) => match snapshot::encode(cart) {
                Ok(raw) => self.store.set(CART_KEY, &raw),
                Err(error) => {
                    warn!(%error, "could not encode cart snapshot");
                    return;
                }
            },
            None => self.store.remove(CART_KEY),
        };

        if let Err(error) = result {
            warn!(%error, "could not write cart snapshot");
        }
    }

    fn discard_snapshot(&self) {
        if let Err(error) = self.store.remove(CART_KEY) {
            warn!(%error, "could not remove cart snapshot");
        }
    }
}

fn expiry(now: Timestamp, ttl: SignedDuration) -> Timestamp {
    now.checked_add(ttl).unwrap_or(Timestamp::MAX)
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;
    use crate::{
        books::{BookStatus, test_support::book},
        clock::ManualClock,
        storage::MemoryStore,
    };

    fn engine() -> Result<(CartReservation<MemoryStore, ManualClock>, ManualClock), jiff::Error> {
        let clock = ManualClock::new("2024-01-15T12:00:00Z".parse()?);

        Ok((CartReservation::new(MemoryStore::new(), clock.clone()), clock))
    }

    #[test]
    fn add_creates_cart_with_fresh_expiry() -> TestResult {
        let (mut cart, clock) = engine()?;
        let dom = book("Dom Casmurro", 29_90, 30);

        cart.add_to_cart(&dom, 2)?;

        assert_eq!(cart.items_count(), 2);
        assert_eq!(cart.total(), 59_80);
        assert_eq!(
            cart.cart().map(|c| c.expires_at),
            Some(clock.now() + CART_TTL)
        );
        assert_eq!(cart.remaining_seconds(), 900);

        Ok(())
    }

    #[test]
    fn add_over_stock_is_rejected_without_change() -> TestResult {
        let (mut cart, _clock) = engine()?;
        let clean = book("Clean Code", 89_90, 4);

        cart.add_to_cart(&clean, 3)?;
        let before = cart.cart().cloned();

        let result = cart.add_to_cart(&clean, 2);

        assert_eq!(
            result,
            Err(CartError::StockExceeded {
                book: clean.uuid,
                requested: 5,
                available: 4
            })
        );
        assert_eq!(cart.cart().cloned(), before);

        Ok(())
    }

    #[test]
    fn add_rejects_zero_and_inactive() -> TestResult {
        let (mut cart, _clock) = engine()?;
        let mut dom = book("Dom Casmurro", 29_90, 30);

        assert_eq!(cart.add_to_cart(&dom, 0), Err(CartError::InvalidQuantity(dom.uuid)));

        dom.status = BookStatus::Inactive;

        assert_eq!(cart.add_to_cart(&dom, 1), Err(CartError::Unavailable(dom.uuid)));
        assert!(cart.cart().is_none());

        Ok(())
    }

    #[test]
    fn repeat_add_merges_and_keeps_first_price() -> TestResult {
        let (mut cart, clock) = engine()?;
        let mut dom = book("Dom Casmurro", 29_90, 30);

        cart.add_to_cart(&dom, 1)?;

        clock.advance(SignedDuration::from_mins(10));
        dom.price = 35_00;
        cart.add_to_cart(&dom, 2)?;

        let line = cart.cart().and_then(|c| c.item(dom.uuid)).cloned();

        assert_eq!(line.as_ref().map(|l| l.quantity), Some(3));
        assert_eq!(line.map(|l| l.price), Some(29_90));
        assert_eq!(cart.cart().map(|c| c.items.len()), Some(1));
        assert_eq!(cart.remaining_seconds(), 900);

        Ok(())
    }

    #[test]
    fn removing_last_line_drops_cart_and_snapshot() -> TestResult {
        let (mut cart, _clock) = engine()?;
        let dom = book("Dom Casmurro", 29_90, 30);

        cart.add_to_cart(&dom, 1)?;
        cart.remove_from_cart(dom.uuid)?;

        assert!(cart.cart().is_none());
        assert_eq!(cart.total(), 0);
        assert_eq!(cart.store.get(CART_KEY)?, None);
        assert_eq!(
            cart.remove_from_cart(dom.uuid),
            Err(CartError::ItemNotFound(dom.uuid))
        );

        Ok(())
    }

    #[test]
    fn remove_does_not_reset_expiry() -> TestResult {
        let (mut cart, clock) = engine()?;
        let dom = book("Dom Casmurro", 29_90, 30);
        let clean = book("Clean Code", 89_90, 4);

        cart.add_to_cart(&dom, 1)?;
        cart.add_to_cart(&clean, 1)?;
        clock.advance(SignedDuration::from_mins(5));
        cart.remove_from_cart(clean.uuid)?;

        assert_eq!(cart.remaining_seconds(), 600);

        Ok(())
    }

    #[test]
    fn update_quantity_bounds_and_expiry() -> TestResult {
        let (mut cart, clock) = engine()?;
        let clean = book("Clean Code", 89_90, 4);

        cart.add_to_cart(&clean, 2)?;
        clock.advance(SignedDuration::from_mins(5));

        cart.update_quantity(clean.uuid, 1)?;
        assert_eq!(cart.remaining_seconds(), 600);

        cart.update_quantity(clean.uuid, 4)?;
        assert_eq!(cart.remaining_seconds(), 900);

        assert_eq!(
            cart.update_quantity(clean.uuid, 5),
            Err(CartError::StockExceeded {
                book: clean.uuid,
                requested: 5,
                available: 4
            })
        );
        assert_eq!(cart.items_count(), 4);

        cart.update_quantity(clean.uuid, 0)?;
        assert!(cart.cart().is_none());

        Ok(())
    }

    #[test]
    fn refresh_book_tightens_stock_bound() -> TestResult {
        let (mut cart, _clock) = engine()?;
        let mut clean = book("Clean Code", 89_90, 4);

        cart.add_to_cart(&clean, 1)?;

        clean.stock = 1;
        assert!(cart.refresh_book(&clean));

        assert!(matches!(
            cart.update_quantity(clean.uuid, 2),
            Err(CartError::StockExceeded { available: 1, .. })
        ));

        Ok(())
    }

    #[test]
    fn tick_counts_down_then_evicts() -> TestResult {
        let (mut cart, clock) = engine()?;
        let dom = book("Dom Casmurro", 29_90, 30);

        assert_eq!(cart.tick(), TickOutcome::Idle);

        cart.add_to_cart(&dom, 1)?;
        clock.advance(SignedDuration::from_millis(14 * 60 * 1000 + 500));

        assert_eq!(cart.tick(), TickOutcome::Active { remaining_seconds: 60 });
        assert!(cart.is_expiring_soon());

        clock.advance(SignedDuration::from_secs(60));

        assert_eq!(cart.tick(), TickOutcome::Expired);
        assert!(cart.cart().is_none());
        assert_eq!(cart.store.get(CART_KEY)?, None);
        assert_eq!(cart.tick(), TickOutcome::Idle);

        Ok(())
    }

    #[test]
    fn restore_keeps_live_and_purges_stale_snapshots() -> TestResult {
        let (mut cart, clock) = engine()?;
        let dom = book("Dom Casmurro", 29_90, 30);

        cart.add_to_cart(&dom, 1)?;

        let mut reloaded = CartReservation::new(&cart.store, clock.clone());
        assert_eq!(reloaded.restore().map(Cart::items_count), Some(1));

        clock.advance(CART_TTL);

        let mut expired = CartReservation::new(&cart.store, clock.clone());
        assert!(expired.restore().is_none());
        assert_eq!(cart.store.get(CART_KEY)?, None);

        cart.store.set(CART_KEY, "{garbage")?;
        let mut corrupt = CartReservation::new(&cart.store, clock);
        assert!(corrupt.restore().is_none());
        assert_eq!(cart.store.get(CART_KEY)?, None);

        Ok(())
    }

    #[test]
    fn consume_clears_only_on_success() -> TestResult {
        let (mut cart, _clock) = engine()?;
        let dom = book("Dom Casmurro", 29_90, 30);

        cart.add_to_cart(&dom, 1)?;

        let failed: Result<(), &str> = cart.consume(|_| Err("blocked"));
        assert_eq!(failed, Err("blocked"));
        assert!(cart.cart().is_some());

        let total = cart.consume(|c| Ok::<_, ()>(c.map_or(0, Cart::total)));
        assert_eq!(total, Ok(29_90));
        assert!(cart.cart().is_none());

        Ok(())
    }
}
