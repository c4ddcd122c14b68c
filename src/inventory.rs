//! Inventory
//!
//! Stock only ever increases through a recorded [`StockEntry`], and every
//! entry leaves an inbound [`StockMovement`] behind it.

use std::fmt;

use decimal_percentage::Percentage;
use jiff::Timestamp;
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::{
    books::{Book, BookUuid, LOW_STOCK_THRESHOLD, PricingGroup},
    ids::TypedUuid,
    orders::{OrderUuid, Restock},
    repository::{Repository, RepositoryError},
};

/// Stock entry UUID
pub type StockEntryUuid = TypedUuid<StockEntry>;

/// Stock movement UUID
pub type StockMovementUuid = TypedUuid<StockMovement>;

/// Inventory errors.
#[derive(Debug, Error, PartialEq)]
pub enum InventoryError {
    /// Entries must add at least one unit.
    #[error("quantity must be greater than zero")]
    InvalidQuantity,

    /// Purchases must carry a cost.
    #[error("cost price must be greater than zero")]
    InvalidCostPrice,

    /// Purchases must name a supplier.
    #[error("supplier is required")]
    MissingSupplier,

    /// The book is not in the catalog.
    #[error("book {0} not found")]
    UnknownBook(BookUuid),

    /// The catalog could not be read or written.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Why stock came in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    /// Bought from a supplier.
    Purchase,

    /// Returned through an exchange.
    Exchange,

    /// Manual correction.
    Adjustment,
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntryType::Purchase => "purchase",
            EntryType::Exchange => "exchange",
            EntryType::Adjustment => "adjustment",
        })
    }
}

/// Movement direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Into stock.
    Inbound,

    /// Out of stock.
    Outbound,
}

/// Stock entry to record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStockEntry {
    /// Book
    pub book_id: BookUuid,

    /// Units received.
    pub quantity: u32,

    /// Unit cost in centavos. Required for purchases.
    pub cost_price: u64,

    /// Supplier name. Required for purchases.
    pub supplier: String,

    /// Why the stock came in.
    pub kind: EntryType,

    /// Free-text notes.
    pub notes: Option<String>,
}

/// A recorded stock entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockEntry {
    /// Identifier
    pub uuid: StockEntryUuid,

    /// Book
    pub book_id: BookUuid,

    /// Units received.
    pub quantity: u32,

    /// Unit cost in centavos.
    pub cost_price: u64,

    /// Cost plus the book's pricing-group margin.
    pub suggested_price: u64,

    /// Supplier name.
    pub supplier: String,

    /// Why the stock came in.
    pub kind: EntryType,

    /// Free-text notes.
    pub notes: Option<String>,

    /// When it was recorded.
    pub entered_at: Timestamp,
}

/// A change to a book's stock level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovement {
    /// Identifier
    pub uuid: StockMovementUuid,

    /// Book
    pub book_id: BookUuid,

    /// In or out.
    pub direction: Direction,

    /// Units moved.
    pub quantity: u32,

    /// Why.
    pub reason: String,

    /// Related document, e.g. an order id.
    pub reference: Option<String>,

    /// When.
    pub at: Timestamp,
}

/// Markup applied to cost prices for each pricing group.
pub fn margin(group: PricingGroup) -> Percentage {
    let points = match group {
        PricingGroup::Literature => 80,
        PricingGroup::Technology | PricingGroup::General => 60,
        PricingGroup::Academic => 50,
        PricingGroup::Children => 70,
    };

    Percentage::from(Decimal::new(points, 2))
}

/// `cost * (1 + margin)`, rounded to the centavo.
pub fn suggested_price(cost: u64, group: PricingGroup) -> u64 {
    let cost = Decimal::from(cost);
    let markup = margin(group) * cost;

    cost.checked_add(markup)
        .map(|price| price.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|price| price.to_u64())
        .unwrap_or(u64::MAX)
}

/// Stock ledger over a book repository.
#[derive(Debug)]
pub struct Inventory<R> {
    books: R,
    entries: Vec<StockEntry>,
    movements: Vec<StockMovement>,
}

impl<R: Repository<Book>> Inventory<R> {
    /// Empty ledger over `books`.
    pub fn new(books: R) -> Self {
        Self {
            books,
            entries: Vec::new(),
            movements: Vec::new(),
        }
    }

    /// Record an entry and credit the book's stock.
    ///
    /// # Errors
    ///
    /// Returns an [`InventoryError`] if the entry is invalid, the book is
    /// unknown, or the catalog is unavailable.
    pub fn record_entry(&mut self, entry: NewStockEntry, at: Timestamp) -> Result<StockEntry, InventoryError> {
        if entry.quantity == 0 {
            return Err(InventoryError::InvalidQuantity);
        }

        if entry.kind == EntryType::Purchase {
            if entry.cost_price == 0 {
                return Err(InventoryError::InvalidCostPrice);
            }

            if entry.supplier.trim().is_empty() {
                return Err(InventoryError::MissingSupplier);
            }
        }

        let mut book = self
            .books
            .find_by_id(entry.book_id)?
            .ok_or(InventoryError::UnknownBook(entry.book_id))?;

        book.stock = book.stock.saturating_add(entry.quantity);

        let suggested_price = suggested_price(entry.cost_price, book.pricing_group);
        let title = book.title.clone();
        let stock = book.stock;

        self.books.save(book)?;

        let recorded = StockEntry {
            uuid: StockEntryUuid::new(),
            book_id: entry.book_id,
            quantity: entry.quantity,
            cost_price: entry.cost_price,
            suggested_price,
            supplier: entry.supplier.trim().to_string(),
            kind: entry.kind,
            notes: entry.notes.filter(|n| !n.trim().is_empty()),
            entered_at: at,
        };

        self.movements.push(StockMovement {
            uuid: StockMovementUuid::new(),
            book_id: entry.book_id,
            direction: Direction::Inbound,
            quantity: entry.quantity,
            reason: format!("stock entry ({})", entry.kind),
            reference: Some(recorded.uuid.short()),
            at,
        });

        self.entries.push(recorded.clone());

        info!(book = %entry.book_id, %title, quantity = entry.quantity, stock, kind = %entry.kind, "recorded stock entry");

        Ok(recorded)
    }

    /// Credit exchanged items back to stock.
    ///
    /// # Errors
    ///
    /// Returns an [`InventoryError`] without crediting anything if any line
    /// is empty or names a book missing from the catalog.
    pub fn restock(&mut self, order: OrderUuid, restocks: &[Restock], at: Timestamp) -> Result<Vec<StockEntry>, InventoryError> {
        for restock in restocks {
            if restock.quantity == 0 {
                return Err(InventoryError::InvalidQuantity);
            }

            if self.books.find_by_id(restock.book_id)?.is_none() {
                return Err(InventoryError::UnknownBook(restock.book_id));
            }
        }

        restocks
            .iter()
            .map(|restock| {
                self.record_entry(
                    NewStockEntry {
                        book_id: restock.book_id,
                        quantity: restock.quantity,
                        cost_price: 0,
                        supplier: String::new(),
                        kind: EntryType::Exchange,
                        notes: Some(format!("returned from order {order}")),
                    },
                    at,
                )
            })
            .collect()
    }

    /// Books at or below the low-stock threshold, lowest first.
    ///
    /// # Errors
    ///
    /// Returns an [`InventoryError`] if the catalog is unavailable.
    pub fn low_stock(&self) -> Result<Vec<Book>, InventoryError> {
        let mut low: Vec<Book> = self
            .books
            .list()?
            .into_iter()
            .filter(|book| book.stock <= LOW_STOCK_THRESHOLD)
            .collect();

        low.sort_by_key(|book| book.stock);

        Ok(low)
    }

    /// Entries, oldest first.
    pub fn entries(&self) -> &[StockEntry] {
        &self.entries
    }

    /// Movements, oldest first.
    pub fn movements(&self) -> &[StockMovement] {
        &self.movements
    }
}
