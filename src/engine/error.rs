use thiserror::Error;

use crate::domain::Customer;
use crate::transport::TransportError;

/// Engine-level errors for joining customers with their orders
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Order fetch failed for customer {}: {source}", .customer.id)]
    OrderFetch {
        customer: Customer,
        #[source]
        source: TransportError,
    },
}

impl EngineError {
    /// The customer whose join failed
    pub fn customer(&self) -> &Customer {
        match self {
            Self::OrderFetch { customer, .. } => customer,
        }
    }
}
