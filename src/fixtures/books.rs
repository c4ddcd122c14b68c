//! Book Fixtures

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::{
    books::{Book, BookStatus, Dimensions, PricingGroup},
    fixtures::FixtureError,
    money::parse_price,
};

/// Wrapper for books in YAML
#[derive(Debug, Deserialize)]
pub struct BooksFixture {
    /// Map of book key -> book fixture
    pub books: BTreeMap<String, BookFixture>,
}

/// Book fixture from YAML
#[derive(Debug, Deserialize)]
pub struct BookFixture {
    /// ISBN
    pub isbn: String,

    /// Title
    pub title: String,

    /// Author
    pub author: String,

    /// Categories
    #[serde(default)]
    pub categories: Vec<String>,

    /// Price string, e.g. "29.90 BRL"
    pub price: String,

    /// Units in stock
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

    /// Edition
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

    /// Exchange eligibility
    #[serde(default = "exchangeable")]
    pub exchangeable: bool,
}

fn exchangeable() -> bool {
    true
}

impl TryFrom<BookFixture> for Book {
    type Error = FixtureError;

    fn try_from(fixture: BookFixture) -> Result<Self, Self::Error> {
        let price = parse_price(&fixture.price)?;

        let mut book = Book::new(
            fixture.isbn,
            fixture.title,
            fixture.author,
            price,
            fixture.stock,
        )?;

        book.categories = fixture.categories;
        book.synopsis = fixture.synopsis;
        book.dimensions = fixture.dimensions;
        book.pages = fixture.pages;
        book.publisher = fixture.publisher;
        book.year = fixture.year;
        book.edition = fixture.edition;
        book.barcode = fixture.barcode;
        book.pricing_group = fixture.pricing_group;
        book.status = fixture.status;
        book.exchangeable = fixture.exchangeable;

        Ok(book)
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;
    use crate::money::PriceError;

    const YAML: &str = r#"
books:
  dom-casmurro:
    isbn: "978-0-789123-45-6"
    title: Dom Casmurro
    author: Machado de Assis
    categories: [Literatura Brasileira, Romance]
    price: "29.90 BRL"
    stock: 30
    dimensions: { height_cm: 20, width_cm: 13, depth_cm: 1.5, weight_g: 200 }
    pricing_group: literature
"#;

    #[test]
    fn parses_book_with_defaults() -> TestResult {
        let fixture: BooksFixture = serde_norway::from_str(YAML)?;
        let raw = fixture.books.into_values().next().ok_or("no books")?;
        let book = Book::try_from(raw)?;

        assert_eq!(book.price, 29_90);
        assert_eq!(book.dimensions.weight_g, 200);
        assert_eq!(book.pricing_group, PricingGroup::Literature);
        assert_eq!(book.status, BookStatus::Active);
        assert!(book.exchangeable);

        Ok(())
    }

    #[test]
    fn rejects_foreign_price() -> TestResult {
        let yaml = YAML.replace("29.90 BRL", "29.90 USD");
        let fixture: BooksFixture = serde_norway::from_str(&yaml)?;
        let raw = fixture.books.into_values().next().ok_or("no books")?;

        assert!(matches!(
            Book::try_from(raw),
            Err(FixtureError::Price(PriceError::UnsupportedCurrency(_)))
        ));

        Ok(())
    }
}
