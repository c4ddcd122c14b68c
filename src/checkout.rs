//! Checkout
//!
//! A [`Checkout`] collects a delivery address, a freight quote and payment
//! allocations for the current cart, and turns them into an [`Order`] once
//! everything is in place. The cart itself stays with the reservation
//! engine; pass [`Checkout::finalize`] to
//! [`CartReservation::consume`](crate::cart::CartReservation::consume) so the
//! cart is only dropped when the order is actually created.

use jiff::{Timestamp, civil::Date};
use thiserror::Error;
use tracing::info;

use crate::{
    cart::Cart,
    customers::{Address, CardBrand, Customer, SavedCard},
    money,
    orders::{NewOrder, Order, OrderLine},
    validation::{self, ValidationError},
};

pub mod freight;
pub mod payments;

use freight::{FreightCalculator, FreightError, FreightQuote};
use payments::{Instrument, InstrumentId, PaymentAggregator, PaymentError};

/// Checkout errors. Each blocked precondition has its own variant.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    /// There is no cart to check out.
    #[error("your cart is empty")]
    EmptyCart,

    /// No delivery address has been chosen.
    #[error("select a delivery address")]
    MissingAddress,

    /// The chosen address is billing-only.
    #[error("{0} is not a delivery address")]
    NotDeliverable(String),

    /// Freight has not been calculated.
    #[error("calculate freight before finalizing")]
    MissingFreight,

    /// The cart changed after freight was calculated.
    #[error("the cart changed since freight was calculated; calculate it again")]
    StaleFreight,

    /// Payments do not cover the amount due.
    #[error("complete the payment before finalizing: {} remaining", money::format(*remaining))]
    Underpaid {
        /// Amount still due.
        remaining: u64,
    },

    /// A payment allocation was refused.
    #[error(transparent)]
    Payment(#[from] PaymentError),

    /// Freight could not be quoted.
    #[error(transparent)]
    Freight(#[from] FreightError),

    /// Entered card or address details were invalid.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// A card typed in at checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCard {
    /// Full card number.
    pub number: String,

    /// Name printed on the card.
    pub holder: String,

    /// CVV
    pub security_code: String,

    /// Expiry month, 1-12.
    pub expiry_month: i8,

    /// Expiry year.
    pub expiry_year: i16,
}

impl NewCard {
    fn brand(&self) -> Result<CardBrand, ValidationError> {
        CardBrand::detect(&self.number).ok_or(ValidationError::InvalidCardNumber)
    }

    /// Validate the card on `today` and produce its payment instrument.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for a malformed, unrecognised or
    /// expired card.
    pub fn instrument(&self, today: Date) -> Result<Instrument, ValidationError> {
        validation::card(
            &self.number,
            &self.holder,
            &self.security_code,
            (self.expiry_month, self.expiry_year),
            today,
        )?;

        let saved = self.to_saved(self.brand()?);

        Ok(Instrument::NewCard {
            label: saved.to_string(),
        })
    }

    /// The masked card to keep on the customer's profile.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidCardNumber`] for an unrecognised card.
    pub fn saved(&self) -> Result<SavedCard, ValidationError> {
        Ok(self.to_saved(self.brand()?))
    }

    fn to_saved(&self, brand: CardBrand) -> SavedCard {
        SavedCard::from_number(
            brand,
            &self.number,
            self.holder.trim(),
            (self.expiry_month, self.expiry_year),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct QuotedFreight {
    quote: FreightQuote,
    subtotal: u64,
    items_count: u32,
}

/// An in-progress checkout for one cart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Checkout {
    address: Option<Address>,
    freight: Option<QuotedFreight>,
    payments: PaymentAggregator,
}

impl Checkout {
    /// Nothing chosen yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Choose where to ship. Any freight quote for a previous address is
    /// discarded.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::NotDeliverable`] for a billing-only address,
    /// or a validation error if the zip code is malformed.
    pub fn select_address(&mut self, address: Address) -> Result<(), CheckoutError> {
        if !address.kind.delivers() {
            return Err(CheckoutError::NotDeliverable(address.identifier));
        }

        validation::zip_code(&address.zip_code)?;

        if self.address.as_ref().is_some_and(|a| a.zip_code != address.zip_code) {
            self.freight = None;
        }

        self.address = Some(address);

        Ok(())
    }

    /// Chosen delivery address.
    pub fn address(&self) -> Option<&Address> {
        self.address.as_ref()
    }

    /// Quote freight for `cart` to the chosen address.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::EmptyCart`] or [`CheckoutError::MissingAddress`]
    /// if there is nothing to quote, or the calculator's error.
    pub fn quote_freight<F>(&mut self, calculator: &F, cart: Option<&Cart>) -> Result<&FreightQuote, CheckoutError>
    where
        F: FreightCalculator + ?Sized,
    {
        let cart = cart.ok_or(CheckoutError::EmptyCart)?;
        let address = self.address.as_ref().ok_or(CheckoutError::MissingAddress)?;

        let quote = calculator.quote(&cart.items, address)?;

        info!(cost = quote.cost, method = %quote.method, "quoted freight");

        let quoted = self.freight.insert(QuotedFreight {
            quote,
            subtotal: cart.total(),
            items_count: cart.items_count(),
        });

        Ok(&quoted.quote)
    }

    /// Current freight quote.
    pub fn freight(&self) -> Option<&FreightQuote> {
        self.freight.as_ref().map(|f| &f.quote)
    }

    /// Cart total plus freight.
    pub fn due(&self, cart: Option<&Cart>) -> u64 {
        let subtotal = cart.map_or(0, Cart::total);

        subtotal.saturating_add(self.freight().map_or(0, |f| f.cost))
    }

    /// Allocate `amount` to `instrument`, replacing any earlier allocation.
    ///
    /// # Errors
    ///
    /// Returns the [`PaymentError`] if the allocation is refused.
    pub fn add_payment(&mut self, instrument: Instrument, amount: u64) -> Result<(), PaymentError> {
        self.payments.allocate(instrument, amount)
    }

    /// Drop an allocation.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::NotAllocated`] if there is none.
    pub fn remove_payment(&mut self, id: &InstrumentId) -> Result<(), PaymentError> {
        self.payments.remove(id).map(|_| ())
    }

    /// Allocations so far.
    pub fn payments(&self) -> &PaymentAggregator {
        &self.payments
    }

    /// Sum of allocations.
    pub fn total_payments(&self) -> u64 {
        self.payments.total()
    }

    /// Amount still to allocate.
    pub fn remaining(&self, cart: Option<&Cart>) -> u64 {
        self.payments.remaining(self.due(cart))
    }

    /// Turn `cart` into an order for `buyer`.
    ///
    /// Preconditions are checked in order: a cart, a delivery address, a
    /// freight quote (non-zero, and computed for the cart as it is now), and
    /// payments covering the amount due.
    ///
    /// # Errors
    ///
    /// Returns the [`CheckoutError`] for the first unmet precondition.
    pub fn finalize(&self, cart: Option<&Cart>, buyer: &Customer, at: Timestamp) -> Result<Order, CheckoutError> {
        let cart = cart.ok_or(CheckoutError::EmptyCart)?;
        let address = self.address.as_ref().ok_or(CheckoutError::MissingAddress)?;

        let freight = self
            .freight
            .as_ref()
            .filter(|f| f.quote.cost > 0)
            .ok_or(CheckoutError::MissingFreight)?;

        if freight.subtotal != cart.total() || freight.items_count != cart.items_count() {
            return Err(CheckoutError::StaleFreight);
        }

        let remaining = self.remaining(Some(cart));

        if remaining > 0 {
            return Err(CheckoutError::Underpaid { remaining });
        }

        let order = Order::place(
            NewOrder {
                customer: buyer.uuid,
                customer_name: buyer.name.clone(),
                customer_email: buyer.email.clone(),
                lines: cart.items.iter().map(OrderLine::from_cart_item).collect(),
                delivery_address: address.clone(),
                freight: freight.quote.cost,
                freight_method: freight.quote.method.clone(),
                payments: self.payments.allocations().to_vec(),
            },
            at,
        );

        info!(order = %order.uuid, customer = %buyer.uuid, total = order.total, "order placed");

        Ok(order)
    }
}
