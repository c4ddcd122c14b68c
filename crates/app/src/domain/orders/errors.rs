//! Orders service errors.

use estante::{
    inventory::InventoryError,
    orders::{OrderUuid, TransitionError},
    repository::RepositoryError,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrdersServiceError {
    #[error("order {0} not found")]
    NotFound(OrderUuid),

    #[error("order {0} belongs to another customer")]
    NotOwner(OrderUuid),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error(transparent)]
    Inventory(#[from] InventoryError),

    #[error("order history unavailable")]
    Repository(#[from] RepositoryError),
}
