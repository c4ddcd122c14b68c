//! Customers service errors.

use estante::{
    customers::{CustomerError, CustomerUuid},
    repository::RepositoryError,
    validation::ValidationError,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CustomersServiceError {
    #[error("customer {0} not found")]
    NotFound(CustomerUuid),

    #[error(transparent)]
    Profile(#[from] CustomerError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
