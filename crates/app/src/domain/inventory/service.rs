//! Inventory service.

use async_trait::async_trait;
use estante::{
    books::{Book, BookUuid},
    inventory::{self, InventoryError, NewStockEntry, StockEntry, StockMovement},
};
use mockall::automock;

use crate::domain::{Books, SharedClock, SharedInventory, inventory::errors::InventoryServiceError};

#[derive(Clone)]
pub struct InMemoryInventoryService {
    books: Books,
    inventory: SharedInventory,
    clock: SharedClock,
}

impl InMemoryInventoryService {
    #[must_use]
    pub fn new(books: Books, inventory: SharedInventory, clock: SharedClock) -> Self {
        Self {
            books,
            inventory,
            clock,
        }
    }
}

#[async_trait]
impl InventoryService for InMemoryInventoryService {
    #[tracing::instrument(name = "inventory.service.record_entry", skip(self, entry), fields(book = %entry.book_id, kind = %entry.kind), err)]
    async fn record_entry(&self, entry: NewStockEntry) -> Result<StockEntry, InventoryServiceError> {
        let now = self.clock.now();

        Ok(self.inventory.lock().await.record_entry(entry, now)?)
    }

    async fn suggested_price(&self, book: BookUuid, cost: u64) -> Result<u64, InventoryServiceError> {
        let book = self
            .books
            .find_by_id(book)?
            .ok_or(InventoryError::UnknownBook(book))?;

        Ok(inventory::suggested_price(cost, book.pricing_group))
    }

    async fn low_stock(&self) -> Result<Vec<Book>, InventoryServiceError> {
        Ok(self.inventory.lock().await.low_stock()?)
    }

    async fn entries(&self) -> Vec<StockEntry> {
        self.inventory.lock().await.entries().to_vec()
    }

    async fn movements(&self) -> Vec<StockMovement> {
        self.inventory.lock().await.movements().to_vec()
    }
}

#[automock]
#[async_trait]
pub trait InventoryService: Send + Sync {
    /// Record incoming stock and credit the book.
    async fn record_entry(&self, entry: NewStockEntry) -> Result<StockEntry, InventoryServiceError>;

    /// Sale price suggested for a book bought at `cost`.
    async fn suggested_price(&self, book: BookUuid, cost: u64) -> Result<u64, InventoryServiceError>;

    /// Books running out, lowest stock first.
    async fn low_stock(&self) -> Result<Vec<Book>, InventoryServiceError>;

    /// Entries recorded this session, oldest first.
    async fn entries(&self) -> Vec<StockEntry>;

    /// Stock movements recorded this session, oldest first.
    async fn movements(&self) -> Vec<StockMovement>;
}

#[cfg(test)]
mod tests {
    use estante::inventory::{Direction, EntryType};
    use testresult::TestResult;

    use super::*;
    use crate::test::TestContext;

    fn purchase(book: BookUuid, quantity: u32) -> NewStockEntry {
        NewStockEntry {
            book_id: book,
            quantity,
            cost_price: 20_00,
            supplier: "Distribuidora Leitura".to_string(),
            kind: EntryType::Purchase,
            notes: None,
        }
    }

    #[tokio::test]
    async fn purchases_credit_stock_and_leave_a_movement() -> TestResult {
        let ctx = TestContext::new()?;
        let kid = ctx.fixture.book("pequeno-principe")?;

        let entry = ctx.stock.record_entry(purchase(kid.uuid, 10)).await?;

        assert_eq!(entry.suggested_price, 34_00);
        assert_eq!(
            ctx.books.find_by_id(kid.uuid)?.map(|b| b.stock),
            Some(kid.stock + 10)
        );

        let movements = ctx.stock.movements().await;

        assert_eq!(movements.len(), 1);
        assert!(movements.iter().all(|m| m.direction == Direction::Inbound));
        assert_eq!(ctx.stock.entries().await, vec![entry]);

        Ok(())
    }

    #[tokio::test]
    async fn purchases_need_cost_and_supplier() -> TestResult {
        let ctx = TestContext::new()?;
        let kid = ctx.fixture.book("pequeno-principe")?.uuid;

        let free = ctx
            .stock
            .record_entry(NewStockEntry {
                cost_price: 0,
                ..purchase(kid, 1)
            })
            .await;

        assert!(matches!(
            free,
            Err(InventoryServiceError::Inventory(InventoryError::InvalidCostPrice))
        ));
        assert!(ctx.stock.entries().await.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn low_stock_lists_books_running_out() -> TestResult {
        let ctx = TestContext::new()?;
        let mut clean = ctx.fixture.book("clean-code")?.clone();

        assert!(ctx.stock.low_stock().await?.is_empty());

        clean.stock = 3;
        ctx.books.save(clean.clone())?;

        let low = ctx.stock.low_stock().await?;

        assert_eq!(low.iter().map(|b| b.uuid).collect::<Vec<_>>(), vec![clean.uuid]);

        Ok(())
    }

    #[tokio::test]
    async fn suggested_price_follows_pricing_group() -> TestResult {
        let ctx = TestContext::new()?;
        let clean = ctx.fixture.book("clean-code")?.uuid;

        assert_eq!(ctx.stock.suggested_price(clean, 50_00).await?, 80_00);

        Ok(())
    }
}
