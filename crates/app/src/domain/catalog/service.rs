//! Catalog service.

use async_trait::async_trait;
use estante::{
    books::{Book, BookError, BookStatus, BookUuid, StatusReason},
    catalog::{self, CatalogQuery},
};
use mockall::automock;
use tracing::info;

use crate::domain::{
    Books, SharedClock,
    catalog::{
        errors::CatalogServiceError,
        models::{BookUpdate, NewBook},
    },
};

#[derive(Clone)]
pub struct InMemoryCatalogService {
    books: Books,
    clock: SharedClock,
}

impl InMemoryCatalogService {
    #[must_use]
    pub fn new(books: Books, clock: SharedClock) -> Self {
        Self { books, clock }
    }

    fn find(&self, uuid: BookUuid) -> Result<Book, CatalogServiceError> {
        self.books
            .find_by_id(uuid)?
            .ok_or(CatalogServiceError::NotFound(uuid))
    }
}

#[async_trait]
impl CatalogService for InMemoryCatalogService {
    #[tracing::instrument(name = "catalog.service.list_books", skip(self, query), err)]
    async fn list_books(&self, query: CatalogQuery) -> Result<Vec<Book>, CatalogServiceError> {
        let books = self.books.list()?;

        Ok(query.apply(&books).into_iter().cloned().collect())
    }

    #[tracing::instrument(name = "catalog.service.get_book", skip(self), fields(book = %uuid), err)]
    async fn get_book(&self, uuid: BookUuid) -> Result<Book, CatalogServiceError> {
        self.find(uuid)
    }

    async fn categories(&self) -> Result<Vec<String>, CatalogServiceError> {
        let books = self.books.list()?;

        Ok(catalog::categories(books.iter().filter(|b| b.is_active())))
    }

    #[tracing::instrument(name = "catalog.service.create_book", skip(self, book), fields(isbn = %book.isbn), err)]
    async fn create_book(&self, book: NewBook) -> Result<Book, CatalogServiceError> {
        let isbn = book.isbn.trim().to_string();

        if self.books.list()?.iter().any(|b| b.isbn == isbn) {
            return Err(CatalogServiceError::DuplicateIsbn(isbn));
        }

        let mut created = Book::new(isbn, book.title.trim(), book.author.trim(), book.price, book.stock)?;

        created.categories = book.categories;
        created.synopsis = book.synopsis;
        created.dimensions = book.dimensions;
        created.pages = book.pages;
        created.publisher = book.publisher;
        created.year = book.year;
        created.edition = book.edition;
        created.barcode = book.barcode;
        created.pricing_group = book.pricing_group;
        created.exchangeable = book.exchangeable;

        self.books.save(created.clone())?;

        info!(book = %created.uuid, title = %created.title, "created book");

        Ok(created)
    }

    #[tracing::instrument(name = "catalog.service.update_book", skip(self, update), fields(book = %uuid), err)]
    async fn update_book(&self, uuid: BookUuid, update: BookUpdate) -> Result<Book, CatalogServiceError> {
        let mut book = self.find(uuid)?;

        if let Some(title) = update.title {
            if title.trim().is_empty() {
                return Err(BookError::MissingField("title").into());
            }

            book.title = title.trim().to_string();
        }

        if let Some(author) = update.author {
            if author.trim().is_empty() {
                return Err(BookError::MissingField("author").into());
            }

            book.author = author.trim().to_string();
        }

        if let Some(categories) = update.categories {
            book.categories = categories;
        }

        if let Some(price) = update.price {
            book.price = price;
        }

        if let Some(synopsis) = update.synopsis {
            book.synopsis = synopsis;
        }

        if let Some(pricing_group) = update.pricing_group {
            book.pricing_group = pricing_group;
        }

        if let Some(exchangeable) = update.exchangeable {
            book.exchangeable = exchangeable;
        }

        self.books.save(book.clone())?;

        info!(book = %uuid, "updated book");

        Ok(book)
    }

    #[tracing::instrument(
        name = "catalog.service.change_status",
        skip(self, reason),
        fields(book = %uuid, %target, %category),
        err
    )]
    async fn change_status(
        &self,
        uuid: BookUuid,
        target: BookStatus,
        category: StatusReason,
        reason: String,
    ) -> Result<Book, CatalogServiceError> {
        let mut book = self.find(uuid)?;

        book.change_status(target, category, &reason, self.clock.now())?;

        self.books.save(book.clone())?;

        info!(book = %uuid, status = %book.status, "changed book status");

        Ok(book)
    }
}

#[automock]
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Books matching `query`.
    async fn list_books(&self, query: CatalogQuery) -> Result<Vec<Book>, CatalogServiceError>;

    /// Retrieve a single book.
    async fn get_book(&self, uuid: BookUuid) -> Result<Book, CatalogServiceError>;

    /// Distinct categories of the books on sale.
    async fn categories(&self) -> Result<Vec<String>, CatalogServiceError>;

    /// Add a book to the catalog.
    async fn create_book(&self, book: NewBook) -> Result<Book, CatalogServiceError>;

    /// Edit a book's descriptive fields.
    async fn update_book(&self, uuid: BookUuid, update: BookUpdate) -> Result<Book, CatalogServiceError>;

    /// Activate or inactivate a book, recording why.
    async fn change_status(
        &self,
        uuid: BookUuid,
        target: BookStatus,
        category: StatusReason,
        reason: String,
    ) -> Result<Book, CatalogServiceError>;
}
