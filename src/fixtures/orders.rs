//! Order Fixtures

use std::collections::BTreeMap;

use jiff::Timestamp;
use serde::Deserialize;

use crate::orders::OrderStatus;

/// Wrapper for orders in YAML
#[derive(Debug, Deserialize)]
pub struct OrdersFixture {
    /// Map of order key -> order fixture
    pub orders: BTreeMap<String, OrderFixture>,
}

/// Order fixture from YAML. Books and customers are referenced by their
/// fixture keys, so those sets must be loaded first.
#[derive(Debug, Deserialize)]
pub struct OrderFixture {
    /// Customer key
    pub customer: String,

    /// Identifier of one of the customer's addresses
    pub address: String,

    /// Purchased lines
    pub lines: Vec<LineFixture>,

    /// Freight price string
    pub freight: String,

    /// Freight carrier and service
    #[serde(default = "freight_method")]
    pub freight_method: String,

    /// Current status
    #[serde(default)]
    pub status: Option<OrderStatus>,

    /// Tracking code, for dispatched orders
    #[serde(default)]
    pub tracking_code: Option<String>,

    /// Creation time
    pub placed_at: Timestamp,

    /// Last transition time; defaults to `placed_at`
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

fn freight_method() -> String {
    "Correios - Sedex".to_string()
}

/// Order line fixture from YAML
#[derive(Debug, Deserialize)]
pub struct LineFixture {
    /// Book key
    pub book: String,

    /// Units
    pub quantity: u32,
}
