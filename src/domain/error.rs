use thiserror::Error;

use super::customer::CustomerId;
use super::order::OrderId;

/// Domain-level errors representing data invariant violations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Order {order_id} belongs to customer {owner}, not requested customer {requested}")]
    ForeignOrder {
        requested: CustomerId,
        owner: CustomerId,
        order_id: OrderId,
    },
}
