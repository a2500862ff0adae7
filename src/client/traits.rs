use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::domain::{Customer, CustomerId, Order};
use crate::transport::TransportError;

/// Body of one customer request; may fail part-way through
pub type CustomerBody = BoxStream<'static, Result<Customer, TransportError>>;

/// Customers as seen by consumers of a fail-soft feed (never an error)
pub type CustomerStream = BoxStream<'static, Customer>;

/// Orders of one customer; a failure is the final item
pub type OrderStream = BoxStream<'static, Result<Order, TransportError>>;

/// Request/response streaming channel to the customer source
#[async_trait]
pub trait CustomerTransport: Send + Sync + 'static {
    /// Issue one request for the full customer list
    async fn open(&self) -> Result<CustomerBody, TransportError>;
}

/// Source of all customers, with any resilience policy already applied
pub trait CustomerFeed: Send + Sync {
    fn fetch_all(&self) -> CustomerStream;
}

/// Per-customer order queries
pub trait OrderSource: Send + Sync {
    fn stream_orders(&self, customer_id: CustomerId) -> OrderStream;
}
