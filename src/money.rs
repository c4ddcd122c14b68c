//! Money
//!
//! Amounts are carried as integer centavos throughout the data model and
//! only become [`Money`] values at the edges, for display.

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use rusty_money::{
    Money,
    iso::{self, Currency},
};
use thiserror::Error;

/// The storefront's single currency.
pub const CURRENCY: &Currency = iso::BRL;

/// Errors raised while parsing price strings.
#[derive(Debug, Error, PartialEq)]
pub enum PriceError {
    /// The string was not a decimal amount, optionally followed by a currency code.
    #[error("invalid price: {0}")]
    InvalidPrice(String),

    /// A currency other than the storefront currency was given.
    #[error("unsupported currency: {0}")]
    UnsupportedCurrency(String),

    /// Negative amounts are never valid prices.
    #[error("price cannot be negative: {0}")]
    Negative(String),
}

/// Wrap centavos as a [`Money`] value in the storefront currency.
pub fn brl(minor: u64) -> Money<'static, Currency> {
    Money::from_minor(i64::try_from(minor).unwrap_or(i64::MAX), CURRENCY)
}

/// Render centavos for display, e.g. `R$29,90`.
pub fn format(minor: u64) -> String {
    brl(minor).to_string()
}

/// Price of `quantity` units at `unit_price`, saturating rather than wrapping.
pub fn line_total(unit_price: u64, quantity: u32) -> u64 {
    unit_price.saturating_mul(u64::from(quantity))
}

/// Sum a sequence of amounts, saturating rather than wrapping.
pub fn sum(amounts: impl IntoIterator<Item = u64>) -> u64 {
    amounts.into_iter().fold(0, u64::saturating_add)
}

/// Parse a price string (e.g. `"29.90 BRL"` or `"29.90"`) into centavos.
///
/// # Errors
///
/// Returns a [`PriceError`] if the amount is not a non-negative decimal or the
/// currency is not the storefront currency.
pub fn parse_price(s: &str) -> Result<u64, PriceError> {
    let mut parts = s.split_whitespace();

    let amount = parts
        .next()
        .ok_or_else(|| PriceError::InvalidPrice(s.to_string()))?;

    if let Some(code) = parts.next()
        && code != CURRENCY.iso_alpha_code
    {
        return Err(PriceError::UnsupportedCurrency(code.to_string()));
    }

    if parts.next().is_some() {
        return Err(PriceError::InvalidPrice(s.to_string()));
    }

    let amount = amount
        .replace(',', ".")
        .parse::<Decimal>()
        .map_err(|_err| PriceError::InvalidPrice(s.to_string()))?;

    if amount.is_sign_negative() {
        return Err(PriceError::Negative(s.to_string()));
    }

    amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .map(|value| value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|value| value.to_u64())
        .ok_or_else(|| PriceError::InvalidPrice(s.to_string()))
}
