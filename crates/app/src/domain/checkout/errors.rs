//! Checkout service errors.

use estante::{
    checkout::{CheckoutError, payments::PaymentError},
    customers::{AddressUuid, CardUuid, CustomerUuid},
    repository::RepositoryError,
    validation::ValidationError,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckoutServiceError {
    #[error("customer {0} not found")]
    CustomerNotFound(CustomerUuid),

    #[error("address {0} not found")]
    AddressNotFound(AddressUuid),

    #[error("card {0} not found")]
    CardNotFound(CardUuid),

    #[error("unknown coupon {0}")]
    UnknownCoupon(String),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error(transparent)]
    Payment(#[from] PaymentError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("store data unavailable")]
    Repository(#[from] RepositoryError),
}
