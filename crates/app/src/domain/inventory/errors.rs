//! Inventory service errors.

use estante::{inventory::InventoryError, repository::RepositoryError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InventoryServiceError {
    #[error(transparent)]
    Inventory(#[from] InventoryError),

    #[error("catalog unavailable")]
    Repository(#[from] RepositoryError),
}
