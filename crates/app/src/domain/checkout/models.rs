//! Checkout models.

use estante::{
    checkout::{NewCard, freight::FreightQuote, payments::Allocation},
    customers::{Address, AddressUuid, CardUuid},
};

/// Where the order ships.
#[derive(Debug, Clone, PartialEq)]
pub enum AddressChoice {
    Saved(AddressUuid),
    New { address: Address, save: bool },
}

/// What pays for part of the order.
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentChoice {
    SavedCard(CardUuid),
    NewCard { card: NewCard, save: bool },
    Coupon(String),
}

/// Running totals of the checkout in progress.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutSummary {
    pub address: Option<Address>,
    pub freight: Option<FreightQuote>,
    pub subtotal: u64,
    pub due: u64,
    pub paid: u64,
    pub remaining: u64,
    pub payments: Vec<Allocation>,
}
