use futures::TryStreamExt;
use tracing::debug;

use super::error::EngineError;
use crate::client::OrderSource;
use crate::domain::{Customer, CustomerOrder};

/// Joins one customer with its complete order list
pub struct OrderJoiner<O: OrderSource> {
    orders: O,
}

impl<O: OrderSource> OrderJoiner<O> {
    pub fn new(orders: O) -> Self {
        Self { orders }
    }

    /// Drain the customer's order stream, in arrival order, into one record
    pub async fn join(&self, customer: Customer) -> Result<CustomerOrder, EngineError> {
        debug!(customer_id = customer.id, "Fetching orders");

        match self.orders.stream_orders(customer.id).try_collect().await {
            Ok(orders) => {
                let record = CustomerOrder::new(customer, orders);
                debug!(
                    customer_id = record.customer.id,
                    orders = record.orders.len(),
                    "Customer joined"
                );
                Ok(record)
            }
            Err(source) => Err(EngineError::OrderFetch { customer, source }),
        }
    }
}
