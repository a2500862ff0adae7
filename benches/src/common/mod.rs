use std::sync::Arc;

use crm_gateway::prelude::*;

/// `count` customers with ids 1..=count
pub fn generate_customers(count: u32) -> Vec<Customer> {
    (1..=count)
        .map(|id| Customer::new(id, format!("customer-{id}")))
        .collect()
}

/// Seeded store for ids 1..=customers served over a fresh connection
///
/// Must be called from within a tokio runtime.
pub fn seeded_order_client(customers: u32, max_orders: u32) -> OrderStreamClient {
    let store = OrderStoreConfig {
        customer_ids: 1..=customers,
        max_orders_per_customer: max_orders,
        seed: Some(42),
    }
    .build()
    .unwrap();

    let handler = Arc::new(OrderQueryHandler::new(Arc::new(store)).unwrap());
    let connection = Arc::new(MultiplexedConnection::connect(handler));
    OrderStreamClient::new(connection).unwrap()
}
