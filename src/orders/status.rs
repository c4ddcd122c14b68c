//! Order status machine

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where an order is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Awaiting payment review.
    Processing,

    /// Payment approved, awaiting dispatch.
    Approved,

    /// Payment refused. Terminal.
    Rejected,

    /// Handed to the carrier.
    InTransit,

    /// Received by the customer. Terminal unless an exchange is requested.
    Delivered,

    /// Customer asked to exchange some items.
    ExchangeRequested,

    /// Exchange approved; waiting for the items to come back.
    ExchangeAuthorized,

    /// Exchanged items received. Terminal.
    Exchanged,
}

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [OrderStatus; 8] = [
        OrderStatus::Processing,
        OrderStatus::Approved,
        OrderStatus::Rejected,
        OrderStatus::InTransit,
        OrderStatus::Delivered,
        OrderStatus::ExchangeRequested,
        OrderStatus::ExchangeAuthorized,
        OrderStatus::Exchanged,
    ];

    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            OrderStatus::Processing => "processing",
            OrderStatus::Approved => "approved",
            OrderStatus::Rejected => "rejected",
            OrderStatus::InTransit => "in transit",
            OrderStatus::Delivered => "delivered",
            OrderStatus::ExchangeRequested => "exchange requested",
            OrderStatus::ExchangeAuthorized => "exchange authorized",
            OrderStatus::Exchanged => "exchanged",
        }
    }

    /// Actions valid from this status.
    pub fn actions(self) -> &'static [OrderAction] {
        match self {
            OrderStatus::Processing => &[OrderAction::Approve, OrderAction::Reject],
            OrderStatus::Approved => &[OrderAction::Dispatch],
            OrderStatus::InTransit => &[OrderAction::MarkDelivered],
            OrderStatus::Delivered => &[OrderAction::RequestExchange],
            OrderStatus::ExchangeRequested => &[OrderAction::AuthorizeExchange],
            OrderStatus::ExchangeAuthorized => &[OrderAction::ConfirmExchangeReceived],
            OrderStatus::Rejected | OrderStatus::Exchanged => &[],
        }
    }

    /// Whether no action is ever valid again. `Delivered` is not terminal:
    /// an exchange may still be requested.
    pub fn is_terminal(self) -> bool {
        self.actions().is_empty()
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A state-changing operation on an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderAction {
    /// `Processing -> Approved`
    Approve,

    /// `Processing -> Rejected`
    Reject,

    /// `Approved -> InTransit`
    Dispatch,

    /// `InTransit -> Delivered`
    MarkDelivered,

    /// `Delivered -> ExchangeRequested`
    RequestExchange,

    /// `ExchangeRequested -> ExchangeAuthorized`
    AuthorizeExchange,

    /// `ExchangeAuthorized -> Exchanged`
    ConfirmExchangeReceived,
}

impl OrderAction {
    /// The only status this action may be applied from.
    pub fn source(self) -> OrderStatus {
        match self {
            OrderAction::Approve | OrderAction::Reject => OrderStatus::Processing,
            OrderAction::Dispatch => OrderStatus::Approved,
            OrderAction::MarkDelivered => OrderStatus::InTransit,
            OrderAction::RequestExchange => OrderStatus::Delivered,
            OrderAction::AuthorizeExchange => OrderStatus::ExchangeRequested,
            OrderAction::ConfirmExchangeReceived => OrderStatus::ExchangeAuthorized,
        }
    }

    /// The status the action produces.
    pub fn target(self) -> OrderStatus {
        match self {
            OrderAction::Approve => OrderStatus::Approved,
            OrderAction::Reject => OrderStatus::Rejected,
            OrderAction::Dispatch => OrderStatus::InTransit,
            OrderAction::MarkDelivered => OrderStatus::Delivered,
            OrderAction::RequestExchange => OrderStatus::ExchangeRequested,
            OrderAction::AuthorizeExchange => OrderStatus::ExchangeAuthorized,
            OrderAction::ConfirmExchangeReceived => OrderStatus::Exchanged,
        }
    }
}

impl fmt::Display for OrderAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OrderAction::Approve => "approve",
            OrderAction::Reject => "reject",
            OrderAction::Dispatch => "dispatch",
            OrderAction::MarkDelivered => "mark delivered",
            OrderAction::RequestExchange => "request exchange",
            OrderAction::AuthorizeExchange => "authorize exchange",
            OrderAction::ConfirmExchangeReceived => "confirm exchange received",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actions_agree_with_sources() {
        for status in OrderStatus::ALL {
            for action in status.actions() {
                assert_eq!(action.source(), status, "{action} listed under {status}");
            }
        }
    }

    #[test]
    fn terminal_states() {
        let terminal: Vec<_> = OrderStatus::ALL
            .into_iter()
            .filter(|s| s.is_terminal())
            .collect();

        assert_eq!(terminal, vec![OrderStatus::Rejected, OrderStatus::Exchanged]);
    }

    #[test]
    fn serializes_screaming_snake_case() -> testresult::TestResult {
        assert_eq!(
            serde_json::to_string(&OrderStatus::ExchangeAuthorized)?,
            "\"EXCHANGE_AUTHORIZED\""
        );

        Ok(())
    }
}
