//! Checkout service.

use std::sync::Arc;

use async_trait::async_trait;
use estante::{
    checkout::{
        Checkout,
        freight::{FreightCalculator, FreightQuote},
        payments::{Coupon, Instrument, InstrumentId},
    },
    customers::{Address, AddressUuid, Customer, CustomerUuid},
    orders::Order,
};
use jiff::tz::TimeZone;
use mockall::automock;
use tokio::sync::Mutex;
use tracing::info;

use crate::domain::{
    Customers, Orders, SharedCart, SharedClock,
    checkout::{
        errors::CheckoutServiceError,
        models::{AddressChoice, CheckoutSummary, PaymentChoice},
    },
};

pub struct InMemoryCheckoutService {
    customers: Customers,
    orders: Orders,
    coupons: Arc<[Coupon]>,
    cart: SharedCart,
    clock: SharedClock,
    freight: Arc<dyn FreightCalculator>,
    state: Mutex<Checkout>,
}

impl InMemoryCheckoutService {
    #[must_use]
    pub fn new(
        customers: Customers,
        orders: Orders,
        coupons: impl Into<Arc<[Coupon]>>,
        cart: SharedCart,
        clock: SharedClock,
        freight: Arc<dyn FreightCalculator>,
    ) -> Self {
        Self {
            customers,
            orders,
            coupons: coupons.into(),
            cart,
            clock,
            freight,
            state: Mutex::new(Checkout::new()),
        }
    }

    fn customer(&self, uuid: CustomerUuid) -> Result<Customer, CheckoutServiceError> {
        self.customers
            .find_by_id(uuid)?
            .ok_or(CheckoutServiceError::CustomerNotFound(uuid))
    }

    fn coupon(&self, code: &str) -> Result<Coupon, CheckoutServiceError> {
        let code = code.trim().to_uppercase();

        self.coupons
            .iter()
            .find(|c| c.code == code)
            .cloned()
            .ok_or(CheckoutServiceError::UnknownCoupon(code))
    }

    fn instrument(
        &self,
        customer: CustomerUuid,
        choice: &PaymentChoice,
    ) -> Result<Instrument, CheckoutServiceError> {
        match choice {
            PaymentChoice::SavedCard(uuid) => {
                let buyer = self.customer(customer)?;
                let card = buyer
                    .card(*uuid)
                    .ok_or(CheckoutServiceError::CardNotFound(*uuid))?;

                Ok(Instrument::SavedCard {
                    card: card.uuid,
                    label: card.to_string(),
                })
            }
            PaymentChoice::NewCard { card, .. } => {
                let today = self.clock.now().to_zoned(TimeZone::UTC).date();

                Ok(card.instrument(today)?)
            }
            PaymentChoice::Coupon(code) => Ok(Instrument::Coupon(self.coupon(code)?)),
        }
    }

    async fn summarize(&self) -> CheckoutSummary {
        let live = self.cart.lock().await;
        let cart = live.engine();
        let state = self.state.lock().await;

        CheckoutSummary {
            address: state.address().cloned(),
            freight: state.freight().cloned(),
            subtotal: cart.total(),
            due: state.due(cart.cart()),
            paid: state.total_payments(),
            remaining: state.remaining(cart.cart()),
            payments: state.payments().allocations().to_vec(),
        }
    }
}

#[async_trait]
impl CheckoutService for InMemoryCheckoutService {
    #[tracing::instrument(name = "checkout.service.select_address", skip(self, choice), fields(%customer), err)]
    async fn select_address(
        &self,
        customer: CustomerUuid,
        choice: AddressChoice,
    ) -> Result<Address, CheckoutServiceError> {
        let address = match choice {
            AddressChoice::Saved(uuid) => self
                .customer(customer)?
                .address(uuid)
                .cloned()
                .ok_or(CheckoutServiceError::AddressNotFound(uuid))?,
            AddressChoice::New { mut address, save } => {
                address.uuid = AddressUuid::new();

                if save {
                    let mut buyer = self.customer(customer)?;

                    address.is_default = buyer.addresses.is_empty();
                    buyer.add_address(address.clone());
                    self.customers.save(buyer)?;

                    info!(%customer, address = %address.uuid, "saved address to profile");
                }

                address
            }
        };

        self.state.lock().await.select_address(address.clone())?;

        Ok(address)
    }

    #[tracing::instrument(name = "checkout.service.quote_freight", skip(self), err)]
    async fn quote_freight(&self) -> Result<FreightQuote, CheckoutServiceError> {
        let live = self.cart.lock().await;
        let mut state = self.state.lock().await;

        let quote = state.quote_freight(self.freight.as_ref(), live.engine().cart())?;

        Ok(quote.clone())
    }

    #[tracing::instrument(name = "checkout.service.add_payment", skip(self, choice), fields(%customer), err)]
    async fn add_payment(
        &self,
        customer: CustomerUuid,
        choice: PaymentChoice,
        amount: u64,
    ) -> Result<CheckoutSummary, CheckoutServiceError> {
        let instrument = self.instrument(customer, &choice)?;

        {
            let mut state = self.state.lock().await;
            let mut next = state.clone();

            next.add_payment(instrument, amount)?;

            if let PaymentChoice::NewCard { card, save: true } = &choice {
                let mut buyer = self.customer(customer)?;

                buyer.add_card(card.saved()?);
                self.customers.save(buyer)?;

                info!(%customer, "saved card to profile");
            }

            *state = next;
        }

        Ok(self.summarize().await)
    }

    async fn remove_payment(&self, id: InstrumentId) -> Result<CheckoutSummary, CheckoutServiceError> {
        self.state.lock().await.remove_payment(&id)?;

        Ok(self.summarize().await)
    }

    async fn summary(&self) -> CheckoutSummary {
        self.summarize().await
    }

    #[tracing::instrument(name = "checkout.service.finalize", skip(self), fields(%customer), err)]
    async fn finalize(&self, customer: CustomerUuid) -> Result<Order, CheckoutServiceError> {
        let buyer = self.customer(customer)?;
        let now = self.clock.now();

        let mut live = self.cart.lock().await;
        let mut state = self.state.lock().await;

        let order = live.engine_mut().consume(|current| {
            let order = state.finalize(current, &buyer, now)?;

            self.orders.save(order.clone())?;

            Ok::<_, CheckoutServiceError>(order)
        })?;

        live.cancel();
        *state = Checkout::new();

        Ok(order)
    }

    async fn reset(&self) {
        *self.state.lock().await = Checkout::new();
    }
}

#[automock]
#[async_trait]
pub trait CheckoutService: Send + Sync {
    /// Choose a saved delivery address or enter a new one.
    async fn select_address(
        &self,
        customer: CustomerUuid,
        choice: AddressChoice,
    ) -> Result<Address, CheckoutServiceError>;

    /// Quote freight for the current cart to the chosen address.
    async fn quote_freight(&self) -> Result<FreightQuote, CheckoutServiceError>;

    /// Allocate `amount` to a payment instrument.
    async fn add_payment(
        &self,
        customer: CustomerUuid,
        choice: PaymentChoice,
        amount: u64,
    ) -> Result<CheckoutSummary, CheckoutServiceError>;

    /// Drop a payment allocation.
    async fn remove_payment(&self, id: InstrumentId) -> Result<CheckoutSummary, CheckoutServiceError>;

    /// Current totals.
    async fn summary(&self) -> CheckoutSummary;

    /// Place the order and release the cart. On failure nothing changes.
    async fn finalize(&self, customer: CustomerUuid) -> Result<Order, CheckoutServiceError>;

    /// Forget the address, freight and payments chosen so far.
    async fn reset(&self);
}
