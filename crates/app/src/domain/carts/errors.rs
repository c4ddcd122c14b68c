//! Cart service errors.

use estante::{books::BookUuid, cart::CartError, repository::RepositoryError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CartsServiceError {
    #[error("book {0} not found")]
    BookNotFound(BookUuid),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error("catalog unavailable")]
    Repository(#[from] RepositoryError),
}
