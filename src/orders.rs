//! Orders
//!
//! Orders are created by checkout and then only ever change through the
//! transition methods below, each of which re-checks the current status
//! before touching anything. A rejected transition leaves the order exactly
//! as it was.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    books::BookUuid,
    cart::CartItem,
    checkout::payments::Allocation,
    customers::{Address, CustomerUuid},
    ids::TypedUuid,
    money,
    repository::Entity,
};

pub mod search;
pub mod status;

pub use search::OrderQuery;
pub use status::{OrderAction, OrderStatus};

/// Order UUID
pub type OrderUuid = TypedUuid<Order>;

/// Order line UUID
pub type OrderLineUuid = TypedUuid<OrderLine>;

/// Errors from order transitions. None of these change the order.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// The order is not in the status the action requires.
    #[error("cannot {action} order {order}: it is {from}")]
    InvalidTransition {
        /// Order
        order: OrderUuid,

        /// Attempted action
        action: OrderAction,

        /// Status at the time
        from: OrderStatus,
    },

    /// Dispatch needs at least one order.
    #[error("no orders selected for dispatch")]
    EmptyBatch,

    /// Dispatch needs a tracking code.
    #[error("a tracking code is required")]
    MissingTrackingCode,

    /// An exchange request needs at least one line.
    #[error("no items selected for exchange")]
    NoItemsSelected,

    /// The line does not belong to the order.
    #[error("order {order} has no line {line}")]
    UnknownLine {
        /// Order
        order: OrderUuid,

        /// Line
        line: OrderLineUuid,
    },

    /// The line's book cannot be exchanged.
    #[error("{title} is not eligible for exchange")]
    NotExchangeable {
        /// Line
        line: OrderLineUuid,

        /// Book title, for the message.
        title: String,
    },
}

/// A purchased book, with its price frozen at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    /// Identifier
    pub uuid: OrderLineUuid,

    /// Book
    pub book_id: BookUuid,

    /// Title at purchase time.
    pub title: String,

    /// Units
    pub quantity: u32,

    /// Unit price in centavos.
    pub unit_price: u64,

    /// Whether the line may be exchanged after delivery.
    pub exchangeable: bool,
}

impl OrderLine {
    /// Freeze a cart line.
    pub fn from_cart_item(item: &CartItem) -> Self {
        Self {
            uuid: OrderLineUuid::new(),
            book_id: item.book_id,
            title: item.book.title.clone(),
            quantity: item.quantity,
            unit_price: item.price,
            exchangeable: item.book.exchangeable,
        }
    }

    /// `unit_price * quantity`.
    pub fn subtotal(&self) -> u64 {
        money::line_total(self.unit_price, self.quantity)
    }
}

/// A customer's request to exchange delivered items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRequest {
    /// Lines under exchange.
    pub line_ids: Vec<OrderLineUuid>,

    /// When the request was made.
    pub requested_at: Timestamp,

    /// Customer's explanation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Stock to credit back after an exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Restock {
    /// Book
    pub book_id: BookUuid,

    /// Units returned.
    pub quantity: u32,
}

/// Receives exchange notifications for the customer.
pub trait ExchangeNotifier {
    /// The exchange on `order` was authorized; tell the customer where to
    /// send the items.
    fn exchange_authorized(&self, order: &Order);
}

/// A notifier that only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl ExchangeNotifier for LogNotifier {
    fn exchange_authorized(&self, order: &Order) {
        info!(order = %order.uuid, customer = %order.customer, "exchange authorized, return address sent");
    }
}

/// Order details captured at checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    /// Buyer
    pub customer: CustomerUuid,

    /// Buyer's name, for admin search.
    pub customer_name: String,

    /// Buyer's email, for admin search.
    pub customer_email: String,

    /// Purchased lines.
    pub lines: Vec<OrderLine>,

    /// Where to ship.
    pub delivery_address: Address,

    /// Freight cost in centavos.
    pub freight: u64,

    /// Freight carrier and service.
    pub freight_method: String,

    /// How the order was paid.
    pub payments: Vec<Allocation>,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Identifier
    pub uuid: OrderUuid,

    /// Buyer
    pub customer: CustomerUuid,

    /// Buyer's name at purchase time.
    pub customer_name: String,

    /// Buyer's email at purchase time.
    pub customer_email: String,

    /// Purchased lines.
    pub lines: Vec<OrderLine>,

    /// Delivery address snapshot.
    pub delivery_address: Address,

    /// Freight cost in centavos.
    pub freight: u64,

    /// Freight carrier and service.
    pub freight_method: String,

    /// Sum of line subtotals.
    pub subtotal: u64,

    /// `subtotal + freight`.
    pub total: u64,

    /// Lifecycle status.
    pub status: OrderStatus,

    /// Carrier tracking code, set on dispatch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_code: Option<String>,

    /// Exchange request, once one is made.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange: Option<ExchangeRequest>,

    /// How the order was paid.
    #[serde(default)]
    pub payments: Vec<Allocation>,

    /// Creation time
    pub created_at: Timestamp,

    /// Last transition time
    pub updated_at: Timestamp,
}

impl Entity for Order {
    type Id = OrderUuid;

    fn id(&self) -> OrderUuid {
        self.uuid
    }
}

impl Order {
    /// Place an order in [`OrderStatus::Processing`].
    pub fn place(new: NewOrder, at: Timestamp) -> Self {
        let subtotal = money::sum(new.lines.iter().map(OrderLine::subtotal));

        Self {
            uuid: OrderUuid::new(),
            customer: new.customer,
            customer_name: new.customer_name,
            customer_email: new.customer_email,
            lines: new.lines,
            delivery_address: new.delivery_address,
            freight: new.freight,
            freight_method: new.freight_method,
            subtotal,
            total: subtotal.saturating_add(new.freight),
            status: OrderStatus::Processing,
            tracking_code: None,
            exchange: None,
            payments: new.payments,
            created_at: at,
            updated_at: at,
        }
    }

    /// Line by id.
    pub fn line(&self, uuid: OrderLineUuid) -> Option<&OrderLine> {
        self.lines.iter().find(|line| line.uuid == uuid)
    }

    /// Sum of quantities.
    pub fn items_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0, |count, line| count.saturating_add(line.quantity))
    }

    /// Whether `action` is valid right now.
    pub fn can(&self, action: OrderAction) -> bool {
        self.status == action.source()
    }

    fn ensure(&self, action: OrderAction) -> Result<(), TransitionError> {
        if self.can(action) {
            return Ok(());
        }

        warn!(order = %self.uuid, %action, from = %self.status, "rejected order transition");

        Err(TransitionError::InvalidTransition {
            order: self.uuid,
            action,
            from: self.status,
        })
    }

    fn apply(&mut self, action: OrderAction, at: Timestamp) {
        let from = self.status;

        self.status = action.target();
        self.updated_at = at;

        info!(order = %self.uuid, %from, to = %self.status, "order transitioned");
    }

    /// `Processing -> Approved`.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::InvalidTransition`] from any other status.
    pub fn approve(&mut self, at: Timestamp) -> Result<(), TransitionError> {
        self.ensure(OrderAction::Approve)?;
        self.apply(OrderAction::Approve, at);

        Ok(())
    }

    /// `Processing -> Rejected`.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::InvalidTransition`] from any other status.
    pub fn reject(&mut self, at: Timestamp) -> Result<(), TransitionError> {
        self.ensure(OrderAction::Reject)?;
        self.apply(OrderAction::Reject, at);

        Ok(())
    }

    /// `InTransit -> Delivered`.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::InvalidTransition`] from any other status.
    pub fn mark_delivered(&mut self, at: Timestamp) -> Result<(), TransitionError> {
        self.ensure(OrderAction::MarkDelivered)?;
        self.apply(OrderAction::MarkDelivered, at);

        Ok(())
    }

    /// `Delivered -> ExchangeRequested` for the given lines.
    ///
    /// # Errors
    ///
    /// Returns a [`TransitionError`] if the order is not delivered, no lines
    /// were given, or a line is unknown or not exchangeable.
    pub fn request_exchange(
        &mut self,
        line_ids: &[OrderLineUuid],
        reason: Option<String>,
        at: Timestamp,
    ) -> Result<(), TransitionError> {
        self.ensure(OrderAction::RequestExchange)?;

        if line_ids.is_empty() {
            return Err(TransitionError::NoItemsSelected);
        }

        for &line_id in line_ids {
            let line = self.line(line_id).ok_or(TransitionError::UnknownLine {
                order: self.uuid,
                line: line_id,
            })?;

            if !line.exchangeable {
                return Err(TransitionError::NotExchangeable {
                    line: line_id,
                    title: line.title.clone(),
                });
            }
        }

        let mut line_ids = line_ids.to_vec();
        line_ids.sort();
        line_ids.dedup();

        self.exchange = Some(ExchangeRequest {
            line_ids,
            requested_at: at,
            reason: reason.map(|r| r.trim().to_string()).filter(|r| !r.is_empty()),
        });

        self.apply(OrderAction::RequestExchange, at);

        Ok(())
    }

    /// `ExchangeRequested -> ExchangeAuthorized`, then notify the customer.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::InvalidTransition`] from any other status.
    pub fn authorize_exchange(
        &mut self,
        notifier: &impl ExchangeNotifier,
        at: Timestamp,
    ) -> Result<(), TransitionError> {
        self.ensure(OrderAction::AuthorizeExchange)?;
        self.apply(OrderAction::AuthorizeExchange, at);

        notifier.exchange_authorized(self);

        Ok(())
    }

    /// `ExchangeAuthorized -> Exchanged`.
    ///
    /// With `return_to_stock`, returns the stock credits for the exchanged
    /// lines; applying them to inventory is up to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::InvalidTransition`] from any other status.
    pub fn confirm_exchange_received(
        &mut self,
        return_to_stock: bool,
        at: Timestamp,
    ) -> Result<SmallVec<[Restock; 4]>, TransitionError> {
        self.ensure(OrderAction::ConfirmExchangeReceived)?;

        let restocks = if return_to_stock {
            self.exchanged_lines()
                .map(|line| Restock {
                    book_id: line.book_id,
                    quantity: line.quantity,
                })
                .collect()
        } else {
            SmallVec::new()
        };

        self.apply(OrderAction::ConfirmExchangeReceived, at);

        Ok(restocks)
    }

    /// Lines named by the exchange request, if any.
    pub fn exchanged_lines(&self) -> impl Iterator<Item = &OrderLine> {
        self.lines.iter().filter(|line| {
            self.exchange
                .as_ref()
                .is_some_and(|exchange| exchange.line_ids.contains(&line.uuid))
        })
    }
}

/// `Approved -> InTransit` for a batch, all sharing one tracking code.
///
/// All-or-nothing: if any order is not approved, none are changed.
///
/// # Errors
///
/// Returns a [`TransitionError`] for an empty batch, a blank tracking code,
/// or the first order that is not approved.
pub fn dispatch(orders: &mut [Order], tracking_code: &str, at: Timestamp) -> Result<(), TransitionError> {
    if orders.is_empty() {
        return Err(TransitionError::EmptyBatch);
    }

    let tracking_code = tracking_code.trim();

    if tracking_code.is_empty() {
        return Err(TransitionError::MissingTrackingCode);
    }

    for order in orders.iter() {
        order.ensure(OrderAction::Dispatch)?;
    }

    for order in orders.iter_mut() {
        order.tracking_code = Some(tracking_code.to_string());
        order.apply(OrderAction::Dispatch, at);
    }

    Ok(())
}


#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use testresult::TestResult;

    use super::{test_support::order, *};

    fn t0() -> Result<Timestamp, jiff::Error> {
        "2024-01-15T12:00:00Z".parse()
    }

    #[derive(Default)]
    struct CountingNotifier(Cell<u32>);

    impl ExchangeNotifier for CountingNotifier {
        fn exchange_authorized(&self, _order: &Order) {
            self.0.set(self.0.get() + 1);
        }
    }

    fn delivered() -> Result<Order, Box<dyn std::error::Error>> {
        let at = t0()?;
        let mut order = order(at);

        order.approve(at)?;
        dispatch(std::slice::from_mut(&mut order), "BR123", at)?;
        order.mark_delivered(at)?;

        Ok(order)
    }

    #[test]
    fn place_computes_totals() -> TestResult {
        let order = order(t0()?);

        assert_eq!(order.subtotal, 149_70);
        assert_eq!(order.total, 165_60);
        assert_eq!(order.items_count(), 3);
        assert_eq!(order.status, OrderStatus::Processing);

        Ok(())
    }

    #[test]
    fn happy_path_through_exchange() -> TestResult {
        let at = t0()?;
        let mut order = delivered()?;
        let notifier = CountingNotifier::default();

        assert_eq!(order.tracking_code.as_deref(), Some("BR123"));

        let dom_line = order.lines.first().map(|l| l.uuid).ok_or("no lines")?;

        order.request_exchange(&[dom_line], Some("  damaged cover ".to_string()), at)?;

        assert_eq!(order.status, OrderStatus::ExchangeRequested);
        assert_eq!(
            order.exchange.as_ref().and_then(|e| e.reason.as_deref()),
            Some("damaged cover")
        );

        order.authorize_exchange(&notifier, at)?;
        assert_eq!(notifier.0.get(), 1);

        let restocks = order.confirm_exchange_received(true, at)?;

        assert_eq!(order.status, OrderStatus::Exchanged);
        assert_eq!(restocks.len(), 1);
        assert_eq!(restocks.first().map(|r| r.quantity), Some(2));

        Ok(())
    }

    #[test]
    fn dispatch_from_processing_is_rejected() -> TestResult {
        let mut orders = vec![order(t0()?)];

        let result = dispatch(&mut orders, "BR123", t0()?);

        assert!(matches!(
            result,
            Err(TransitionError::InvalidTransition {
                action: OrderAction::Dispatch,
                from: OrderStatus::Processing,
                ..
            })
        ));
        assert_eq!(orders.first().map(|o| o.status), Some(OrderStatus::Processing));
        assert_eq!(orders.first().and_then(|o| o.tracking_code.clone()), None);

        Ok(())
    }

    #[test]
    fn dispatch_is_all_or_nothing() -> TestResult {
        let at = t0()?;
        let mut approved = order(at);
        approved.approve(at)?;

        let mut orders = vec![approved, order(at)];

        assert!(dispatch(&mut orders, "BR123", at).is_err());
        assert!(orders.iter().all(|o| o.tracking_code.is_none()));
        assert_eq!(orders.first().map(|o| o.status), Some(OrderStatus::Approved));

        assert_eq!(dispatch(&mut [], "BR123", at), Err(TransitionError::EmptyBatch));
        assert_eq!(
            dispatch(&mut orders, "  ", at),
            Err(TransitionError::MissingTrackingCode)
        );

        Ok(())
    }

    #[test]
    fn exchange_only_from_delivered() -> TestResult {
        let at = t0()?;
        let mut order = order(at);
        order.approve(at)?;
        dispatch(std::slice::from_mut(&mut order), "BR123", at)?;

        let line = order.lines.first().map(|l| l.uuid).ok_or("no lines")?;
        let before = order.clone();

        assert!(matches!(
            order.request_exchange(&[line], None, at),
            Err(TransitionError::InvalidTransition {
                from: OrderStatus::InTransit,
                ..
            })
        ));
        assert_eq!(order, before);

        Ok(())
    }

    #[test]
    fn exchange_validates_lines() -> TestResult {
        let at = t0()?;
        let mut order = delivered()?;
        let final_sale = order.lines.get(1).map(|l| l.uuid).ok_or("no second line")?;
        let stranger = OrderLineUuid::new();

        assert_eq!(order.request_exchange(&[], None, at), Err(TransitionError::NoItemsSelected));
        assert_eq!(
            order.request_exchange(&[stranger], None, at),
            Err(TransitionError::UnknownLine {
                order: order.uuid,
                line: stranger
            })
        );
        assert!(matches!(
            order.request_exchange(&[final_sale], None, at),
            Err(TransitionError::NotExchangeable { .. })
        ));
        assert_eq!(order.status, OrderStatus::Delivered);

        Ok(())
    }

    #[test]
    fn terminal_orders_reject_everything() -> TestResult {
        let at = t0()?;
        let mut order = order(at);
        order.reject(at)?;

        assert!(order.approve(at).is_err());
        assert!(order.reject(at).is_err());
        assert!(order.mark_delivered(at).is_err());
        assert!(order.confirm_exchange_received(true, at).is_err());
        assert_eq!(order.status, OrderStatus::Rejected);

        Ok(())
    }

    #[test]
    fn receiving_without_restock_returns_nothing() -> TestResult {
        let at = t0()?;
        let mut order = delivered()?;
        let line = order.lines.first().map(|l| l.uuid).ok_or("no lines")?;

        order.request_exchange(&[line], None, at)?;
        order.authorize_exchange(&LogNotifier, at)?;

        assert!(order.confirm_exchange_received(false, at)?.is_empty());

        Ok(())
    }
}
