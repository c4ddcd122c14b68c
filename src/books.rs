//! Books

use std::fmt;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{ids::TypedUuid, repository::Entity};

/// Book UUID
pub type BookUuid = TypedUuid<Book>;

/// Stock at or below this level is reported as low.
pub const LOW_STOCK_THRESHOLD: u32 = 5;

/// Errors from admin book lifecycle operations.
#[derive(Debug, Error, PartialEq)]
pub enum BookError {
    /// The book is already in the requested status.
    #[error("book {0} is already {1}")]
    AlreadyInStatus(BookUuid, BookStatus),

    /// Status changes must carry a justification.
    #[error("a reason is required to change a book's status")]
    MissingReason,

    /// The reason category does not apply to this kind of status change.
    #[error("{0} is not a valid reason to mark a book {1}")]
    CategoryMismatch(StatusReason, BookStatus),

    /// A required descriptive field was blank.
    #[error("{0} is required")]
    MissingField(&'static str),
}

/// Whether a book can be sold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BookStatus {
    /// Listed and purchasable.
    #[default]
    Active,

    /// Withdrawn from sale.
    Inactive,
}

impl fmt::Display for BookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookStatus::Active => f.write_str("active"),
            BookStatus::Inactive => f.write_str("inactive"),
        }
    }
}

/// Pricing group, which determines the margin applied to cost prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PricingGroup {
    /// Fiction and classics.
    Literature,

    /// Programming and engineering.
    Technology,

    /// Textbooks and research.
    Academic,

    /// Children's books.
    Children,

    /// Anything not otherwise grouped.
    #[default]
    General,
}

/// Physical dimensions, used for freight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Dimensions {
    /// Height in centimetres.
    pub height_cm: f64,

    /// Width in centimetres.
    pub width_cm: f64,

    /// Depth in centimetres.
    pub depth_cm: f64,

    /// Weight in grams.
    pub weight_g: u32,
}

/// Categorised justification for activating or inactivating a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusReason {
    /// No longer on the market.
    OutOfMarket,

    /// Discontinued by the publisher.
    Discontinued,

    /// Editorial problem with the edition.
    EditorialProblem,

    /// Too little demand.
    LowDemand,

    /// Stock was replenished.
    Restock,

    /// A new edition became available.
    NewEdition,

    /// Demand picked back up.
    DemandIncreased,

    /// Correcting an earlier mistake.
    SystemCorrection,
}

impl StatusReason {
    /// The status this reason justifies moving to.
    pub fn target(self) -> BookStatus {
        match self {
            StatusReason::OutOfMarket
            | StatusReason::Discontinued
            | StatusReason::EditorialProblem
            | StatusReason::LowDemand => BookStatus::Inactive,
            StatusReason::Restock
            | StatusReason::NewEdition
            | StatusReason::DemandIncreased
            | StatusReason::SystemCorrection => BookStatus::Active,
        }
    }
}

impl fmt::Display for StatusReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StatusReason::OutOfMarket => "out of market",
            StatusReason::Discontinued => "discontinued",
            StatusReason::EditorialProblem => "editorial problem",
            StatusReason::LowDemand => "low demand",
            StatusReason::Restock => "restock",
            StatusReason::NewEdition => "new edition",
            StatusReason::DemandIncreased => "demand increased",
            StatusReason::SystemCorrection => "system correction",
        };

        f.write_str(label)
    }
}

/// Audit entry for a status change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChange {
    /// New status.
    pub status: BookStatus,

    /// Reason category.
    pub category: StatusReason,

    /// Free-text justification.
    pub reason: String,

    /// When the change happened.
    pub at: Timestamp,
}

/// Stock level classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockStatus {
    /// Nothing left.
    OutOfStock,

    /// At or below [`LOW_STOCK_THRESHOLD`].
    Low,

    /// Comfortably stocked.
    Available,
}

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    /// Identifier
    pub uuid: BookUuid,

    /// ISBN
    pub isbn: String,

    /// Title
    pub title: String,

    /// Author
    pub author: String,

    /// Categories, most specific first.
    #[serde(default)]
    pub categories: Vec<String>,

    /// Unit price in centavos.
    pub price: u64,

    /// Units available for sale.
    pub stock: u32,

    /// Synopsis
    #[serde(default)]
    pub synopsis: String,

    /// Dimensions
    #[serde(default)]
    pub dimensions: Dimensions,

    /// Page count
    #[serde(default)]
    pub pages: u32,

    /// Publisher
    #[serde(default)]
    pub publisher: String,

    /// Publication year
    #[serde(default)]
    pub year: i16,

    /// Edition label
    #[serde(default)]
    pub edition: String,

    /// Barcode
    #[serde(default)]
    pub barcode: String,

    /// Pricing group
    #[serde(default)]
    pub pricing_group: PricingGroup,

    /// Sale status
    #[serde(default)]
    pub status: BookStatus,

    /// Whether purchased copies may be exchanged after delivery.
    #[serde(default = "default_exchangeable")]
    pub exchangeable: bool,

    /// Status change history, oldest first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub status_history: Vec<StatusChange>,
}

fn default_exchangeable() -> bool {
    true
}

impl Entity for Book {
    type Id = BookUuid;

    fn id(&self) -> BookUuid {
        self.uuid
    }
}

impl Book {
    /// Create an active book with the required descriptive fields.
    ///
    /// # Errors
    ///
    /// Returns [`BookError::MissingField`] if the title, author or ISBN is blank.
    pub fn new(
        isbn: impl Into<String>,
        title: impl Into<String>,
        author: impl Into<String>,
        price: u64,
        stock: u32,
    ) -> Result<Self, BookError> {
        let (isbn, title, author) = (isbn.into(), title.into(), author.into());

        for (field, value) in [("isbn", &isbn), ("title", &title), ("author", &author)] {
            if value.trim().is_empty() {
                return Err(BookError::MissingField(field));
            }
        }

        Ok(Self {
            uuid: BookUuid::new(),
            isbn,
            title,
            author,
            categories: Vec::new(),
            price,
            stock,
            synopsis: String::new(),
            dimensions: Dimensions::default(),
            pages: 0,
            publisher: String::new(),
            year: 0,
            edition: String::new(),
            barcode: String::new(),
            pricing_group: PricingGroup::default(),
            status: BookStatus::Active,
            exchangeable: true,
            status_history: Vec::new(),
        })
    }

    /// Whether the book is listed for sale.
    pub fn is_active(&self) -> bool {
        self.status == BookStatus::Active
    }

    /// Classify the current stock level.
    pub fn stock_status(&self) -> StockStatus {
        match self.stock {
            0 => StockStatus::OutOfStock,
            n if n <= LOW_STOCK_THRESHOLD => StockStatus::Low,
            _ => StockStatus::Available,
        }
    }

    /// Move the book to the status implied by `category`, recording why.
    ///
    /// # Errors
    ///
    /// Returns a [`BookError`] if the reason is blank, the category points at
    /// a different status than `target`, or the book is already there.
    pub fn change_status(
        &mut self,
        target: BookStatus,
        category: StatusReason,
        reason: &str,
        at: Timestamp,
    ) -> Result<(), BookError> {
        if reason.trim().is_empty() {
            return Err(BookError::MissingReason);
        }

        if category.target() != target {
            return Err(BookError::CategoryMismatch(category, target));
        }

        if self.status == target {
            return Err(BookError::AlreadyInStatus(self.uuid, target));
        }

        self.status = target;
        self.status_history.push(StatusChange {
            status: target,
            category,
            reason: reason.trim().to_string(),
            at,
        });

        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// A minimal active book for tests.
    pub(crate) fn book(title: &str, price: u64, stock: u32) -> Book {
        let mut book = Book::new(format!("isbn-{title}"), title, "Author", price, stock)
            .unwrap_or_else(|_err| unreachable!("fields are non-empty"));

        book.dimensions.weight_g = 300;

        book
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::{test_support::book, *};

    #[test]
    fn new_rejects_blank_title() {
        let result = Book::new("978", " ", "Machado de Assis", 29_90, 1);

        assert_eq!(result, Err(BookError::MissingField("title")));
    }

    #[test]
    fn stock_status_thresholds() {
        assert_eq!(book("a", 1, 0).stock_status(), StockStatus::OutOfStock);
        assert_eq!(book("b", 1, 5).stock_status(), StockStatus::Low);
        assert_eq!(book("c", 1, 6).stock_status(), StockStatus::Available);
    }

    #[test]
    fn inactivate_records_history() -> TestResult {
        let mut dom = book("Dom Casmurro", 29_90, 30);
        let at: Timestamp = "2024-01-15T12:00:00Z".parse()?;

        dom.change_status(
            BookStatus::Inactive,
            StatusReason::Discontinued,
            "publisher stopped printing",
            at,
        )?;

        assert!(!dom.is_active());
        assert_eq!(dom.status_history.len(), 1);
        assert_eq!(
            dom.status_history.first().map(|c| c.category),
            Some(StatusReason::Discontinued)
        );

        Ok(())
    }

    #[test]
    fn change_status_rejects_mismatched_category_and_noop() -> TestResult {
        let mut dom = book("Dom Casmurro", 29_90, 30);
        let at: Timestamp = "2024-01-15T12:00:00Z".parse()?;

        assert_eq!(
            dom.change_status(BookStatus::Inactive, StatusReason::Restock, "x", at),
            Err(BookError::CategoryMismatch(
                StatusReason::Restock,
                BookStatus::Inactive
            ))
        );
        assert_eq!(
            dom.change_status(BookStatus::Active, StatusReason::Restock, "x", at),
            Err(BookError::AlreadyInStatus(dom.uuid, BookStatus::Active))
        );
        assert_eq!(
            dom.change_status(BookStatus::Inactive, StatusReason::LowDemand, "", at),
            Err(BookError::MissingReason)
        );

        Ok(())
    }
}
