use futures::{StreamExt, stream};
use tracing::debug;

use super::traits::OrderLookup;
use crate::domain::CustomerId;
use crate::transport::{ORDERS_ROUTE, PayloadStream, RequestHandler, RouteTemplate, TransportError};

/// Serves `orders.{customerId}` request-streams from an order store
///
/// The store is passed in by handle; each request streams that customer's
/// orders as JSON payloads, in stored order.
pub struct OrderQueryHandler<L: OrderLookup> {
    store: L,
    route: RouteTemplate,
}

impl<L: OrderLookup> OrderQueryHandler<L> {
    pub fn new(store: L) -> Result<Self, TransportError> {
        Ok(Self {
            store,
            route: RouteTemplate::parse(ORDERS_ROUTE)?,
        })
    }

    fn customer_id(&self, route: &str) -> Result<CustomerId, TransportError> {
        self.route
            .extract(route)
            .and_then(|key| key.parse().ok())
            .ok_or_else(|| TransportError::UnknownRoute(route.to_string()))
    }
}

impl<L: OrderLookup + 'static> RequestHandler for OrderQueryHandler<L> {
    fn request_stream(&self, route: &str) -> Result<PayloadStream, TransportError> {
        let customer_id = self.customer_id(route)?;
        let orders = self.store.lookup(customer_id);
        debug!(customer_id, count = orders.len(), "Streaming orders");

        Ok(stream::iter(0..orders.len())
            .map(move |index| serde_json::to_vec(&orders[index]).map_err(TransportError::from))
            .boxed())
    }
}
