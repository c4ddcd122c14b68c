//! Freight

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{cart::CartItem, customers::Address, validation};

/// Freight quoting errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FreightError {
    /// There is nothing to ship.
    #[error("nothing to ship")]
    NothingToShip,

    /// The destination zip code is unusable.
    #[error("invalid destination zip code: {0}")]
    InvalidZipCode(String),
}

/// A shipping price for a set of items to one address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreightQuote {
    /// Cost in centavos.
    pub cost: u64,

    /// Carrier and service, e.g. "Correios - Sedex".
    pub method: String,
}

/// Shipping-rate collaborator.
pub trait FreightCalculator: Send + Sync {
    /// Price shipping `items` to `destination`.
    ///
    /// # Errors
    ///
    /// Returns a [`FreightError`] if the items or destination cannot be quoted.
    fn quote(&self, items: &[CartItem], destination: &Address) -> Result<FreightQuote, FreightError>;
}

/// Flat fee plus a fee per started kilogram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightBasedFreight {
    base: u64,
    per_kg: u64,
    method: String,
}

impl Default for WeightBasedFreight {
    fn default() -> Self {
        Self::new(10_00, 5_00, "Correios - Sedex")
    }
}

impl WeightBasedFreight {
    /// Calculator charging `base + per_kg * started_kg`.
    pub fn new(base: u64, per_kg: u64, method: impl Into<String>) -> Self {
        Self {
            base,
            per_kg,
            method: method.into(),
        }
    }
}

impl FreightCalculator for WeightBasedFreight {
    fn quote(&self, items: &[CartItem], destination: &Address) -> Result<FreightQuote, FreightError> {
        if items.is_empty() {
            return Err(FreightError::NothingToShip);
        }

        validation::zip_code(&destination.zip_code)
            .map_err(|_err| FreightError::InvalidZipCode(destination.zip_code.clone()))?;

        let grams = items.iter().fold(0_u64, |total, item| {
            total.saturating_add(
                u64::from(item.book.dimensions.weight_g).saturating_mul(u64::from(item.quantity)),
            )
        });

        let started_kg = grams.div_ceil(1000);

        Ok(FreightQuote {
            cost: self.base.saturating_add(self.per_kg.saturating_mul(started_kg)),
            method: self.method.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use testresult::TestResult;

    use super::*;
    use crate::{books::test_support::book, customers::test_support::address};

    fn line(weight_g: u32, quantity: u32) -> CartItem {
        let mut book = book("Dom Casmurro", 29_90, 30);
        book.dimensions.weight_g = weight_g;

        CartItem {
            book_id: book.uuid,
            book,
            quantity,
            price: 29_90,
            added_at: Timestamp::UNIX_EPOCH,
        }
    }

    #[test]
    fn charges_per_started_kilogram() -> TestResult {
        let freight = WeightBasedFreight::default();
        let casa = address("Casa");

        let light = freight.quote(&[line(300, 1)], &casa)?;
        let heavy = freight.quote(&[line(600, 2)], &casa)?;

        assert_eq!(light.cost, 15_00);
        assert_eq!(heavy.cost, 20_00);
        assert_eq!(heavy.method, "Correios - Sedex");

        Ok(())
    }

    #[test]
    fn rejects_bad_zip_and_empty_items() {
        let freight = WeightBasedFreight::default();
        let mut casa = address("Casa");

        assert_eq!(freight.quote(&[], &casa), Err(FreightError::NothingToShip));

        casa.zip_code = "123".to_string();

        assert_eq!(
            freight.quote(&[line(300, 1)], &casa),
            Err(FreightError::InvalidZipCode("123".to_string()))
        );
    }
}
