//! Session models.

use estante::customers::{Address, Gender};
use jiff::civil::Date;

/// Sign-up form.
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub name: String,
    pub cpf: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
    pub gender: Gender,
    pub birth_date: Date,
    pub phone: String,

    /// First address, saved as the default.
    pub address: Option<Address>,
}
