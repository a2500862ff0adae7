use serde::{Deserialize, Serialize};

use super::customer::{Customer, CustomerId};
use super::error::DomainError;

/// Order identifier, unique within its owning customer's list
pub type OrderId = u32;

/// An order owned by exactly one customer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub customer_id: CustomerId,
    pub id: OrderId,
}

impl Order {
    pub fn new(customer_id: CustomerId, id: OrderId) -> Self {
        Self { customer_id, id }
    }

    /// Verify this order belongs to the customer it was requested for
    pub fn ensure_owned_by(&self, customer_id: CustomerId) -> Result<(), DomainError> {
        if self.customer_id != customer_id {
            return Err(DomainError::ForeignOrder {
                requested: customer_id,
                owner: self.customer_id,
                order_id: self.id,
            });
        }
        Ok(())
    }
}

/// Joined view of a customer and its full order list
///
/// Built once per aggregation pass and never mutated after emission.
/// `error` is only set on degraded records, when the order fetch failed and
/// the failure was isolated rather than aborting the joined stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerOrder {
    pub customer: Customer,
    pub orders: Vec<Order>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CustomerOrder {
    pub fn new(customer: Customer, orders: Vec<Order>) -> Self {
        Self {
            customer,
            orders,
            error: None,
        }
    }

    /// A record for a customer whose orders could not be fetched
    pub fn degraded(customer: Customer, error: impl Into<String>) -> Self {
        Self {
            customer,
            orders: Vec::new(),
            error: Some(error.into()),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }
}
