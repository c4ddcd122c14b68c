//! Order search

use crate::{
    customers::CustomerUuid,
    orders::{Order, OrderStatus},
};

/// Admin and customer order listing filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderQuery {
    /// Case-insensitive match against the order id, customer name or email.
    pub text: Option<String>,

    /// Restrict to one status.
    pub status: Option<OrderStatus>,

    /// Restrict to one customer's orders.
    pub customer: Option<CustomerUuid>,
}

impl OrderQuery {
    /// One customer's orders.
    pub fn for_customer(customer: CustomerUuid) -> Self {
        Self {
            customer: Some(customer),
            ..Self::default()
        }
    }

    /// Whether `order` passes every filter.
    pub fn matches(&self, order: &Order) -> bool {
        if self.customer.is_some_and(|c| order.customer != c) {
            return false;
        }

        if self.status.is_some_and(|s| order.status != s) {
            return false;
        }

        match self.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            Some(text) => {
                let needle = text.to_lowercase();

                order.uuid.to_string().contains(&needle)
                    || order.customer_name.to_lowercase().contains(&needle)
                    || order.customer_email.to_lowercase().contains(&needle)
            }
            None => true,
        }
    }

    /// Matching orders, newest first.
    pub fn apply<'a>(&self, orders: impl IntoIterator<Item = &'a Order>) -> Vec<&'a Order> {
        let mut hits: Vec<&Order> = orders.into_iter().filter(|o| self.matches(o)).collect();

        hits.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        hits
    }
}
