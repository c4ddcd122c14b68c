//! Carts service.

use async_trait::async_trait;
use estante::{
    books::{Book, BookUuid},
    cart::TickOutcome,
};
use mockall::automock;
use tokio::sync::watch;

use crate::domain::{
    Books, SharedCart,
    carts::{CartLifecycle, errors::CartsServiceError, models::CartView},
};

#[derive(Clone)]
pub struct InMemoryCartsService {
    books: Books,
    cart: SharedCart,
}

impl InMemoryCartsService {
    #[must_use]
    pub fn new(books: Books, cart: SharedCart) -> Self {
        Self { books, cart }
    }

    fn book(&self, uuid: BookUuid) -> Result<Book, CartsServiceError> {
        self.books
            .find_by_id(uuid)?
            .ok_or(CartsServiceError::BookNotFound(uuid))
    }
}

#[async_trait]
impl CartsService for InMemoryCartsService {
    async fn restore(&self) -> CartView {
        let mut live = self.cart.lock().await;

        live.engine_mut().restore();
        CartLifecycle::sync(&self.cart, &mut live);

        CartView::of(live.engine())
    }

    #[tracing::instrument(name = "carts.service.add", skip(self), err)]
    async fn add(&self, book: BookUuid, quantity: u32) -> Result<CartView, CartsServiceError> {
        let book = self.book(book)?;
        let mut live = self.cart.lock().await;

        live.engine_mut().refresh_book(&book);

        let added = live.engine_mut().add_to_cart(&book, quantity);

        CartLifecycle::sync(&self.cart, &mut live);
        added?;

        Ok(CartView::of(live.engine()))
    }

    #[tracing::instrument(name = "carts.service.remove", skip(self), err)]
    async fn remove(&self, book: BookUuid) -> Result<CartView, CartsServiceError> {
        let mut live = self.cart.lock().await;

        let removed = live.engine_mut().remove_from_cart(book);

        CartLifecycle::sync(&self.cart, &mut live);
        removed?;

        Ok(CartView::of(live.engine()))
    }

    #[tracing::instrument(name = "carts.service.update", skip(self), err)]
    async fn update(&self, book: BookUuid, quantity: u32) -> Result<CartView, CartsServiceError> {
        let mut live = self.cart.lock().await;

        if let Some(current) = self.books.find_by_id(book)? {
            live.engine_mut().refresh_book(&current);
        }

        let updated = live.engine_mut().update_quantity(book, quantity);

        CartLifecycle::sync(&self.cart, &mut live);
        updated?;

        Ok(CartView::of(live.engine()))
    }

    async fn clear(&self) {
        let mut live = self.cart.lock().await;

        live.engine_mut().clear();
        CartLifecycle::sync(&self.cart, &mut live);
    }

    async fn view(&self) -> CartView {
        CartView::of(self.cart.lock().await.engine())
    }

    async fn tick(&self) -> TickOutcome {
        self.cart.lock().await.tick()
    }

    async fn countdown(&self) -> watch::Receiver<TickOutcome> {
        self.cart.lock().await.subscribe()
    }

    async fn is_ticking(&self) -> bool {
        self.cart.lock().await.is_ticking()
    }
}

#[automock]
#[async_trait]
pub trait CartsService: Send + Sync {
    /// Rehydrate the cart from durable storage.
    async fn restore(&self) -> CartView;

    /// Reserve `quantity` more copies of a book.
    async fn add(&self, book: BookUuid, quantity: u32) -> Result<CartView, CartsServiceError>;

    /// Drop a line.
    async fn remove(&self, book: BookUuid) -> Result<CartView, CartsServiceError>;

    /// Set a line's quantity; zero removes it.
    async fn update(&self, book: BookUuid, quantity: u32) -> Result<CartView, CartsServiceError>;

    /// Drop the whole cart.
    async fn clear(&self);

    /// Current reservation.
    async fn view(&self) -> CartView;

    /// Advance the expiry countdown now.
    async fn tick(&self) -> TickOutcome;

    /// Countdown outcomes as the background task publishes them.
    async fn countdown(&self) -> watch::Receiver<TickOutcome>;

    /// Whether a countdown task is running, which it is exactly while a
    /// cart exists.
    async fn is_ticking(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use estante::{
        books::{BookStatus, StatusReason},
        cart::CartError,
        storage::{CART_KEY, KeyValueStore},
    };
    use jiff::SignedDuration;
    use testresult::TestResult;

    use super::*;
    use crate::{domain::catalog::CatalogService, test::TestContext};

    #[tokio::test]
    async fn add_reserves_and_persists() -> TestResult {
        let ctx = TestContext::new()?;
        let dom = ctx.fixture.book("dom-casmurro")?.uuid;

        let view = ctx.carts.add(dom, 2).await?;

        assert_eq!(view.items_count, 2);
        assert_eq!(view.total, 59_80);
        assert_eq!(view.remaining_seconds, 900);
        assert!(!view.expiring_soon);
        assert!(ctx.store.get(CART_KEY)?.is_some());

        Ok(())
    }

    #[tokio::test]
    async fn stock_checks_use_live_catalog_numbers() -> TestResult {
        let ctx = TestContext::new()?;
        let mut clean = ctx.fixture.book("clean-code")?.clone();

        ctx.carts.add(clean.uuid, 3).await?;

        clean.stock = 4;
        ctx.books.save(clean.clone())?;

        let result = ctx.carts.add(clean.uuid, 2).await;

        assert!(matches!(
            result,
            Err(CartsServiceError::Cart(CartError::StockExceeded {
                requested: 5,
                available: 4,
                ..
            }))
        ));
        assert_eq!(ctx.carts.view().await.items_count, 3);

        Ok(())
    }

    #[tokio::test]
    async fn inactive_books_cannot_be_reserved() -> TestResult {
        let ctx = TestContext::new()?;
        let uuid = ctx.fixture.book("1984")?.uuid;

        ctx.catalog
            .change_status(
                uuid,
                BookStatus::Inactive,
                StatusReason::LowDemand,
                "sem procura".to_string(),
            )
            .await?;

        let result = ctx.carts.add(uuid, 1).await;

        assert!(matches!(
            result,
            Err(CartsServiceError::Cart(CartError::Unavailable(u))) if u == uuid
        ));

        Ok(())
    }

    #[tokio::test]
    async fn tick_expires_the_reservation() -> TestResult {
        let ctx = TestContext::new()?;
        let dom = ctx.fixture.book("dom-casmurro")?.uuid;

        ctx.carts.add(dom, 1).await?;
        ctx.clock.advance(SignedDuration::from_mins(11));

        let view = ctx.carts.view().await;

        assert_eq!(view.remaining_seconds, 240);
        assert!(view.expiring_soon);

        ctx.clock.advance(SignedDuration::from_mins(4));

        assert_eq!(ctx.carts.tick().await, TickOutcome::Expired);
        assert!(ctx.carts.view().await.is_empty());
        assert_eq!(ctx.store.get(CART_KEY)?, None);
        assert_eq!(ctx.carts.tick().await, TickOutcome::Idle);

        Ok(())
    }

    #[tokio::test]
    async fn countdown_follows_the_cart() -> TestResult {
        let ctx = TestContext::new()?;
        let dom = ctx.fixture.book("dom-casmurro")?.uuid;
        let kid = ctx.fixture.book("pequeno-principe")?.uuid;

        assert!(!ctx.carts.is_ticking().await);

        ctx.carts.add(dom, 1).await?;
        ctx.carts.add(kid, 1).await?;

        assert!(ctx.carts.is_ticking().await);

        ctx.carts.remove(dom).await?;

        assert!(ctx.carts.is_ticking().await);

        ctx.carts.update(kid, 0).await?;

        assert!(!ctx.carts.is_ticking().await);

        ctx.carts.add(dom, 1).await?;
        ctx.carts.clear().await;

        assert!(!ctx.carts.is_ticking().await);

        let refused = ctx.carts.add(dom, 1_000).await;

        assert!(refused.is_err());
        assert!(!ctx.carts.is_ticking().await);

        ctx.carts.add(dom, 1).await?;
        ctx.clock.advance(SignedDuration::from_mins(16));

        assert_eq!(ctx.carts.tick().await, TickOutcome::Expired);
        assert!(!ctx.carts.is_ticking().await);

        Ok(())
    }

    #[tokio::test]
    async fn restored_cart_resumes_its_countdown() -> TestResult {
        let ctx = TestContext::new()?;
        let dom = ctx.fixture.book("dom-casmurro")?.uuid;

        ctx.carts.add(dom, 1).await?;

        let later = TestContext::with_store(std::sync::Arc::clone(&ctx.store))?;

        assert!(!later.carts.is_ticking().await);

        let view = later.carts.restore().await;

        assert_eq!(view.items_count, 1);
        assert!(later.carts.is_ticking().await);

        Ok(())
    }

    #[tokio::test]
    async fn update_to_zero_removes_the_line() -> TestResult {
        let ctx = TestContext::new()?;
        let dom = ctx.fixture.book("dom-casmurro")?.uuid;
        let kid = ctx.fixture.book("pequeno-principe")?.uuid;

        ctx.carts.add(dom, 1).await?;
        ctx.carts.add(kid, 1).await?;

        let view = ctx.carts.update(dom, 0).await?;

        assert_eq!(view.items_count, 1);

        let view = ctx.carts.remove(kid).await?;

        assert!(view.is_empty());

        Ok(())
    }
}
