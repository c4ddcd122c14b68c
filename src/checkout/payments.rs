//! Payment aggregation
//!
//! A checkout may be paid with several instruments at once. Allocations are
//! keyed by instrument, so allocating to the same instrument twice replaces
//! the earlier amount.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::{customers::CardUuid, money};

/// Smallest amount that may be charged to a credit card on its own.
pub const MIN_CARD_CHARGE: u64 = 10_00;

/// Payment errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PaymentError {
    /// Allocations must be positive.
    #[error("payment amount must be greater than zero")]
    InvalidAmount,

    /// Card allocation under [`MIN_CARD_CHARGE`] with no coupon in play.
    #[error("minimum credit card charge is {}", money::format(MIN_CARD_CHARGE))]
    BelowCardMinimum {
        /// Refused amount.
        amount: u64,
    },

    /// A coupon cannot cover more than its face value.
    #[error("coupon {code} is worth at most {}", money::format(*value))]
    ExceedsCouponValue {
        /// Coupon code
        code: String,

        /// Face value
        value: u64,
    },

    /// No allocation exists for the instrument.
    #[error("no payment allocated to {0}")]
    NotAllocated(InstrumentId),
}

/// Coupon origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CouponKind {
    /// Marketing promotion.
    Promotional,

    /// Credit issued for an exchanged item.
    Exchange,
}

/// A coupon with a fixed face value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    /// Redemption code
    pub code: String,

    /// Origin
    pub kind: CouponKind,

    /// Face value in centavos.
    pub value: u64,
}

/// Something that can pay for part of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Instrument {
    /// A card on the customer's profile.
    SavedCard {
        /// Card on file
        card: CardUuid,

        /// Display label, e.g. `Visa **** 1234`.
        label: String,
    },

    /// A card entered at checkout.
    NewCard {
        /// Display label
        label: String,
    },

    /// A promotional or exchange coupon.
    Coupon(Coupon),
}

/// Allocation key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InstrumentId {
    /// Saved card
    SavedCard(CardUuid),

    /// The card entered at checkout. There is at most one.
    NewCard,

    /// Coupon, by code.
    Coupon(String),
}

impl fmt::Display for InstrumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstrumentId::SavedCard(uuid) => write!(f, "card {}", uuid.short()),
            InstrumentId::NewCard => f.write_str("new card"),
            InstrumentId::Coupon(code) => write!(f, "coupon {code}"),
        }
    }
}

impl Instrument {
    /// Allocation key.
    pub fn id(&self) -> InstrumentId {
        match self {
            Instrument::SavedCard { card, .. } => InstrumentId::SavedCard(*card),
            Instrument::NewCard { .. } => InstrumentId::NewCard,
            Instrument::Coupon(coupon) => InstrumentId::Coupon(coupon.code.clone()),
        }
    }

    /// Whether this is a credit card.
    pub fn is_card(&self) -> bool {
        !self.is_coupon()
    }

    /// Whether this is a coupon.
    pub fn is_coupon(&self) -> bool {
        matches!(self, Instrument::Coupon(_))
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instrument::SavedCard { label, .. } | Instrument::NewCard { label } => {
                f.write_str(label)
            }
            Instrument::Coupon(coupon) => match coupon.kind {
                CouponKind::Promotional => write!(f, "promotional coupon {}", coupon.code),
                CouponKind::Exchange => write!(f, "exchange coupon {}", coupon.code),
            },
        }
    }
}

/// An amount charged to one instrument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    /// Instrument
    pub instrument: Instrument,

    /// Amount in centavos.
    pub amount: u64,
}

/// Accumulates allocations against an amount due.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentAggregator {
    allocations: Vec<Allocation>,
}

impl PaymentAggregator {
    /// No allocations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the allocation for `instrument`.
    ///
    /// # Errors
    ///
    /// Returns a [`PaymentError`] for a zero amount, a coupon amount above
    /// its face value, or a card amount under [`MIN_CARD_CHARGE`] while no
    /// coupon has been allocated.
    pub fn allocate(&mut self, instrument: Instrument, amount: u64) -> Result<(), PaymentError> {
        if amount == 0 {
            return Err(PaymentError::InvalidAmount);
        }

        if let Instrument::Coupon(coupon) = &instrument
            && amount > coupon.value
        {
            return Err(PaymentError::ExceedsCouponValue {
                code: coupon.code.clone(),
                value: coupon.value,
            });
        }

        if instrument.is_card() && amount < MIN_CARD_CHARGE && self.coupon_total() == 0 {
            return Err(PaymentError::BelowCardMinimum { amount });
        }

        let id = instrument.id();

        debug!(instrument = %id, amount, "allocated payment");

        match self.allocations.iter_mut().find(|a| a.instrument.id() == id) {
            Some(existing) => existing.amount = amount,
            None => self.allocations.push(Allocation { instrument, amount }),
        }

        Ok(())
    }

    /// Drop the allocation for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::NotAllocated`] if there is none.
    pub fn remove(&mut self, id: &InstrumentId) -> Result<Allocation, PaymentError> {
        let index = self
            .allocations
            .iter()
            .position(|a| &a.instrument.id() == id)
            .ok_or_else(|| PaymentError::NotAllocated(id.clone()))?;

        Ok(self.allocations.remove(index))
    }

    /// Allocations, in the order first made.
    pub fn allocations(&self) -> &[Allocation] {
        &self.allocations
    }

    /// Sum of all allocations.
    pub fn total(&self) -> u64 {
        money::sum(self.allocations.iter().map(|a| a.amount))
    }

    /// Sum of coupon allocations.
    pub fn coupon_total(&self) -> u64 {
        money::sum(
            self.allocations
                .iter()
                .filter(|a| a.instrument.is_coupon())
                .map(|a| a.amount),
        )
    }

    /// `max(0, due - total)`.
    pub fn remaining(&self, due: u64) -> u64 {
        due.saturating_sub(self.total())
    }

    /// Give up the allocations, e.g. to record them on an order.
    pub fn into_allocations(self) -> Vec<Allocation> {
        self.allocations
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn visa() -> Instrument {
        Instrument::SavedCard {
            card: CardUuid::new(),
            label: "Visa **** 1234".to_string(),
        }
    }

    fn coupon(code: &str, value: u64) -> Instrument {
        Instrument::Coupon(Coupon {
            code: code.to_string(),
            kind: CouponKind::Exchange,
            value,
        })
    }

    #[test]
    fn coupon_and_card_cover_the_due_amount() -> TestResult {
        let mut payments = PaymentAggregator::new();

        payments.allocate(coupon("TROCA50", 60_00), 60_00)?;
        payments.allocate(visa(), 40_00)?;

        assert_eq!(payments.total(), 100_00);
        assert_eq!(payments.remaining(100_00), 0);

        Ok(())
    }

    #[test]
    fn reallocating_an_instrument_replaces_its_amount() -> TestResult {
        let mut payments = PaymentAggregator::new();
        let card = visa();

        payments.allocate(card.clone(), 50_00)?;
        payments.allocate(card, 49_00)?;

        assert_eq!(payments.allocations().len(), 1);
        assert_eq!(payments.remaining(100_00), 51_00);

        Ok(())
    }

    #[test]
    fn small_card_charge_needs_a_coupon() -> TestResult {
        let mut payments = PaymentAggregator::new();

        assert_eq!(
            payments.allocate(visa(), 5_00),
            Err(PaymentError::BelowCardMinimum { amount: 5_00 })
        );
        assert_eq!(payments.total(), 0);

        payments.allocate(coupon("PROMO25", 25_00), 25_00)?;
        payments.allocate(visa(), 5_00)?;

        assert_eq!(payments.total(), 30_00);

        Ok(())
    }

    #[test]
    fn coupon_allocation_is_capped_at_face_value() {
        let mut payments = PaymentAggregator::new();

        assert_eq!(
            payments.allocate(coupon("PROMO25", 25_00), 30_00),
            Err(PaymentError::ExceedsCouponValue {
                code: "PROMO25".to_string(),
                value: 25_00
            })
        );
        assert_eq!(payments.allocate(visa(), 0), Err(PaymentError::InvalidAmount));
    }

    #[test]
    fn remaining_never_goes_negative() -> TestResult {
        let mut payments = PaymentAggregator::new();

        payments.allocate(visa(), 120_00)?;

        assert_eq!(payments.remaining(100_00), 0);

        let removed = payments.remove(&InstrumentId::NewCard);

        assert_eq!(removed, Err(PaymentError::NotAllocated(InstrumentId::NewCard)));

        Ok(())
    }
}
