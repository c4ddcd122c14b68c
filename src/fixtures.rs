//! Fixtures
//!
//! Mock datasets for the storefront, loaded from YAML under a base directory
//! laid out as `<base>/<category>/<name>.yml`.

use std::{fs, path::PathBuf};

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::{
    books::{Book, BookError, BookUuid},
    checkout::payments::{Allocation, Coupon, Instrument},
    customers::{AdminAccount, Customer, CustomerUuid},
    fixtures::{
        books::BooksFixture, coupons::CouponsFixture, customers::CustomersFixture,
        orders::OrdersFixture,
    },
    money::{PriceError, parse_price},
    orders::{NewOrder, Order, OrderLine, OrderLineUuid},
};

pub mod books;
pub mod coupons;
pub mod customers;
pub mod orders;

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price
    #[error(transparent)]
    Price(#[from] PriceError),

    /// Invalid book
    #[error(transparent)]
    Book(#[from] BookError),

    /// Invalid card expiry
    #[error("Invalid card expiry: {0}")]
    InvalidExpiry(String),

    /// Book not found
    #[error("Book not found: {0}")]
    BookNotFound(String),

    /// Customer not found
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    /// Address not found on the customer
    #[error("Customer {customer} has no address {address}")]
    AddressNotFound {
        /// Customer key
        customer: String,

        /// Address identifier
        address: String,
    },
}

/// Fixture
#[derive(Debug)]
pub struct Fixture {
    /// Base path for fixture files
    base_path: PathBuf,

    books: Vec<Book>,
    customers: Vec<Customer>,
    admins: Vec<AdminAccount>,
    coupons: Vec<Coupon>,
    orders: Vec<Order>,

    /// Fixture key -> id mappings for cross-references
    book_keys: FxHashMap<String, BookUuid>,
    customer_keys: FxHashMap<String, CustomerUuid>,
}

impl Fixture {
    /// Create a new empty fixture with default base path
    pub fn new() -> Self {
        Self::with_base_path("./fixtures")
    }

    /// Create a new empty fixture with custom base path
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            books: Vec::new(),
            customers: Vec::new(),
            admins: Vec::new(),
            coupons: Vec::new(),
            orders: Vec::new(),
            book_keys: FxHashMap::default(),
            customer_keys: FxHashMap::default(),
        }
    }

    fn read(&self, category: &str, name: &str) -> Result<String, FixtureError> {
        let file_path = self.base_path.join(category).join(format!("{name}.yml"));

        Ok(fs::read_to_string(file_path)?)
    }

    /// Load books from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or a book is invalid.
    pub fn load_books(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let fixture: BooksFixture = serde_norway::from_str(&self.read("books", name)?)?;

        for (key, book_fixture) in fixture.books {
            let book = Book::try_from(book_fixture)?;

            self.book_keys.insert(key, book.uuid);
            self.books.push(book);
        }

        Ok(self)
    }

    /// Load customers and admin accounts from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or a card expiry is invalid.
    pub fn load_customers(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let fixture: CustomersFixture = serde_norway::from_str(&self.read("customers", name)?)?;

        for (key, customer_fixture) in fixture.customers {
            let customer = Customer::try_from(customer_fixture)?;

            self.customer_keys.insert(key, customer.uuid);
            self.customers.push(customer);
        }

        self.admins.extend(fixture.admins);

        Ok(self)
    }

    /// Load coupons from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or a value is invalid.
    pub fn load_coupons(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let fixture: CouponsFixture = serde_norway::from_str(&self.read("coupons", name)?)?;

        for coupon_fixture in fixture.coupons {
            self.coupons.push(Coupon::try_from(coupon_fixture)?);
        }

        Ok(self)
    }

    /// Load orders from a YAML fixture file. Orders are paid in full with the
    /// customer's default card.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or a referenced
    /// book, customer or address does not exist.
    pub fn load_orders(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let fixture: OrdersFixture = serde_norway::from_str(&self.read("orders", name)?)?;

        for order_fixture in fixture.orders.into_values() {
            let customer = self.customer(&order_fixture.customer)?;

            let delivery_address = customer
                .addresses
                .iter()
                .find(|a| a.identifier == order_fixture.address)
                .cloned()
                .ok_or_else(|| FixtureError::AddressNotFound {
                    customer: order_fixture.customer.clone(),
                    address: order_fixture.address.clone(),
                })?;

            let instrument = customer
                .cards
                .iter()
                .find(|c| c.is_default)
                .or_else(|| customer.cards.first())
                .map_or_else(
                    || Instrument::NewCard {
                        label: "Credit card".to_string(),
                    },
                    |card| Instrument::SavedCard {
                        card: card.uuid,
                        label: card.to_string(),
                    },
                );

            let lines = order_fixture
                .lines
                .iter()
                .map(|line| {
                    let book = self.book(&line.book)?;

                    Ok(OrderLine {
                        uuid: OrderLineUuid::new(),
                        book_id: book.uuid,
                        title: book.title.clone(),
                        quantity: line.quantity,
                        unit_price: book.price,
                        exchangeable: book.exchangeable,
                    })
                })
                .collect::<Result<Vec<_>, FixtureError>>()?;

            let mut order = Order::place(
                NewOrder {
                    customer: customer.uuid,
                    customer_name: customer.name.clone(),
                    customer_email: customer.email.clone(),
                    lines,
                    delivery_address,
                    freight: parse_price(&order_fixture.freight)?,
                    freight_method: order_fixture.freight_method,
                    payments: Vec::new(),
                },
                order_fixture.placed_at,
            );

            order.payments = vec![Allocation {
                instrument,
                amount: order.total,
            }];

            if let Some(status) = order_fixture.status {
                order.status = status;
            }

            order.tracking_code = order_fixture.tracking_code;
            order.updated_at = order_fixture.updated_at.unwrap_or(order_fixture.placed_at);

            self.orders.push(order);
        }

        Ok(self)
    }

    /// Load a complete fixture set (books, customers, coupons and orders with the same name)
    ///
    /// # Errors
    ///
    /// Returns an error if any of the fixture files cannot be loaded.
    pub fn from_set(name: &str) -> Result<Self, FixtureError> {
        Self::from_set_in("./fixtures", name)
    }

    /// Load a complete fixture set from a custom base path
    ///
    /// # Errors
    ///
    /// Returns an error if any of the fixture files cannot be loaded.
    pub fn from_set_in(base_path: impl Into<PathBuf>, name: &str) -> Result<Self, FixtureError> {
        let mut fixture = Self::with_base_path(base_path);

        fixture
            .load_books(name)?
            .load_customers(name)?
            .load_coupons(name)?
            .load_orders(name)?;

        Ok(fixture)
    }

    /// Get a book by its fixture key
    ///
    /// # Errors
    ///
    /// Returns an error if the book is not found.
    pub fn book(&self, key: &str) -> Result<&Book, FixtureError> {
        let uuid = self
            .book_keys
            .get(key)
            .ok_or_else(|| FixtureError::BookNotFound(key.to_string()))?;

        self.books
            .iter()
            .find(|b| b.uuid == *uuid)
            .ok_or_else(|| FixtureError::BookNotFound(key.to_string()))
    }

    /// Get a customer by its fixture key
    ///
    /// # Errors
    ///
    /// Returns an error if the customer is not found.
    pub fn customer(&self, key: &str) -> Result<&Customer, FixtureError> {
        let uuid = self
            .customer_keys
            .get(key)
            .ok_or_else(|| FixtureError::CustomerNotFound(key.to_string()))?;

        self.customers
            .iter()
            .find(|c| c.uuid == *uuid)
            .ok_or_else(|| FixtureError::CustomerNotFound(key.to_string()))
    }

    /// All books, in key order
    pub fn books(&self) -> &[Book] {
        &self.books
    }

    /// All customers, in key order
    pub fn customers(&self) -> &[Customer] {
        &self.customers
    }

    /// Administrator accounts
    pub fn admins(&self) -> &[AdminAccount] {
        &self.admins
    }

    /// Coupons
    pub fn coupons(&self) -> &[Coupon] {
        &self.coupons
    }

    /// Orders, in key order
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::{fs, path::Path};

    use testresult::TestResult;

    use super::*;
    use crate::orders::OrderStatus;

    fn write_fixture(base: &Path, category: &str, name: &str, contents: &str) -> TestResult {
        let dir = base.join(category);

        fs::create_dir_all(&dir)?;
        fs::write(dir.join(format!("{name}.yml")), contents)?;

        Ok(())
    }

    #[test]
    fn fixture_from_set_loads_default_store() -> TestResult {
        let fixture = Fixture::from_set("default")?;

        assert_eq!(fixture.books().len(), 5);
        assert_eq!(fixture.customers().len(), 2);
        assert_eq!(fixture.admins().len(), 1);
        assert_eq!(fixture.coupons().len(), 2);
        assert_eq!(fixture.orders().len(), 2);

        let dom = fixture.book("dom-casmurro")?;

        assert_eq!(dom.title, "Dom Casmurro");
        assert_eq!(dom.price, 29_90);

        Ok(())
    }

    #[test]
    fn orders_resolve_books_customers_and_addresses() -> TestResult {
        let fixture = Fixture::from_set("default")?;
        let ana = fixture.customer("ana")?;

        let order = fixture
            .orders()
            .iter()
            .find(|o| o.customer == ana.uuid)
            .ok_or("ana has no order")?;

        assert_eq!(order.status, OrderStatus::Delivered);
        assert_eq!(order.subtotal, 129_70);
        assert_eq!(order.total, 145_60);
        assert_eq!(order.delivery_address.identifier, "Casa Principal");
        assert_eq!(order.payments.first().map(|p| p.amount), Some(145_60));

        Ok(())
    }

    #[test]
    fn fixture_book_not_found_returns_error() {
        let fixture = Fixture::new();
        let result = fixture.book("nonexistent");

        assert!(matches!(result, Err(FixtureError::BookNotFound(_))));
    }

    #[test]
    fn orders_referencing_unknown_books_are_rejected() -> TestResult {
        let dir = tempfile::tempdir()?;

        write_fixture(
            dir.path(),
            "customers",
            "broken",
            "customers:\n  ana:\n    code: CLI001\n    name: Ana\n    cpf: \"123.456.789-09\"\n    email: ana@email.com\n    password_digest: x\n    gender: F\n    birth_date: \"1990-05-15\"\n    phone: \"11991234567\"\n    addresses:\n      - identifier: Casa\n        street: Rua A\n        number: \"1\"\n        neighborhood: Centro\n        city: São Paulo\n        state: SP\n        zip_code: \"01234-567\"\n",
        )?;

        write_fixture(
            dir.path(),
            "orders",
            "broken",
            "orders:\n  first:\n    customer: ana\n    address: Casa\n    lines:\n      - book: missing\n        quantity: 1\n    freight: \"15.90\"\n    placed_at: \"2024-01-15T10:30:00Z\"\n",
        )?;

        let mut fixture = Fixture::with_base_path(dir.path());

        fixture.load_customers("broken")?;

        let result = fixture.load_orders("broken");

        assert!(matches!(result, Err(FixtureError::BookNotFound(key)) if key == "missing"));

        Ok(())
    }

    #[test]
    fn orders_referencing_unknown_addresses_are_rejected() -> TestResult {
        let mut fixture = Fixture::new();

        fixture.load_books("default")?.load_customers("default")?;

        let dir = tempfile::tempdir()?;

        write_fixture(
            dir.path(),
            "orders",
            "broken",
            "orders:\n  first:\n    customer: ana\n    address: Praia\n    lines: []\n    freight: \"15.90\"\n    placed_at: \"2024-01-15T10:30:00Z\"\n",
        )?;

        fixture.base_path = dir.path().to_path_buf();

        let result = fixture.load_orders("broken");

        assert!(matches!(result, Err(FixtureError::AddressNotFound { .. })));

        Ok(())
    }
}
