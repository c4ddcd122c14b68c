//! Session service errors.

use estante::{repository::RepositoryError, storage::StorageError, validation::ValidationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("this account is inactive")]
    InactiveAccount,

    #[error("email already registered")]
    EmailTaken,

    #[error("CPF already registered")]
    CpfTaken,

    #[error("log in first")]
    NotLoggedIn,

    #[error("administrator access required")]
    Forbidden,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("customer directory unavailable")]
    Repository(#[from] RepositoryError),

    #[error("session storage failed")]
    Storage(#[from] StorageError),

    #[error("session record could not be encoded")]
    Encode(#[source] serde_json::Error),
}
