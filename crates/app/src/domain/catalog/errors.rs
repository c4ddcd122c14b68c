//! Catalog service errors.

use estante::{
    books::{BookError, BookUuid},
    repository::RepositoryError,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogServiceError {
    #[error("book {0} not found")]
    NotFound(BookUuid),

    #[error("another book already uses ISBN {0}")]
    DuplicateIsbn(String),

    #[error(transparent)]
    Book(#[from] BookError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
