use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, ready};

use futures::{Stream, StreamExt, future, stream};
use pin_project_lite::pin_project;
use tracing::debug;

use super::traits::{OrderSource, OrderStream};
use crate::domain::{CustomerId, Order};
use crate::transport::{MultiplexedConnection, ORDERS_ROUTE, RouteTemplate, TransportError};

/// Per-customer order queries over a shared multiplexed connection
///
/// Applies no retry or fallback: a failure ends only the affected
/// customer's stream and is left to the caller.
pub struct OrderStreamClient {
    connection: Arc<MultiplexedConnection>,
    route: RouteTemplate,
}

impl OrderStreamClient {
    /// Query `orders.{customerId}` on `connection`
    pub fn new(connection: Arc<MultiplexedConnection>) -> Result<Self, TransportError> {
        Self::with_route(connection, ORDERS_ROUTE)
    }

    pub fn with_route(
        connection: Arc<MultiplexedConnection>,
        template: &str,
    ) -> Result<Self, TransportError> {
        Ok(Self {
            connection,
            route: RouteTemplate::parse(template)?,
        })
    }

    pub fn connection(&self) -> &Arc<MultiplexedConnection> {
        &self.connection
    }
}

impl OrderSource for OrderStreamClient {
    fn stream_orders(&self, customer_id: CustomerId) -> OrderStream {
        match self.connection.request_stream(self.route.expand(customer_id)) {
            Ok(payloads) => DecodedOrders::new(payloads, customer_id).boxed(),
            Err(e) => {
                debug!(customer_id, error = %e, "Order request could not be issued");
                stream::once(future::ready(Err(e))).boxed()
            }
        }
    }
}

pin_project! {
    /// Orders decoded from one customer's payload stream
    ///
    /// Ends after the first failure, which is yielded as the final item.
    pub struct DecodedOrders<S> {
        #[pin]
        payloads: S,
        customer_id: CustomerId,
        failed: bool,
    }
}

impl<S> DecodedOrders<S> {
    pub fn new(payloads: S, customer_id: CustomerId) -> Self {
        Self {
            payloads,
            customer_id,
            failed: false,
        }
    }
}

impl<S> Stream for DecodedOrders<S>
where
    S: Stream<Item = Result<Vec<u8>, TransportError>>,
{
    type Item = Result<Order, TransportError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        if *this.failed {
            return Poll::Ready(None);
        }

        let Some(payload) = ready!(this.payloads.poll_next(cx)) else {
            return Poll::Ready(None);
        };

        let customer_id = *this.customer_id;
        let decoded = payload.and_then(|bytes| decode_order(&bytes, customer_id));
        if decoded.is_err() {
            *this.failed = true;
        }
        Poll::Ready(Some(decoded))
    }
}

fn decode_order(bytes: &[u8], customer_id: CustomerId) -> Result<Order, TransportError> {
    let order: Order = serde_json::from_slice(bytes)?;
    order.ensure_owned_by(customer_id)?;
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainError;
    use crate::storage::{KeyedOrderStore, OrderQueryHandler};
    use futures::TryStreamExt;

    fn payload(order: Order) -> Result<Vec<u8>, TransportError> {
        Ok(serde_json::to_vec(&order).unwrap())
    }

    fn client_for(store: KeyedOrderStore) -> OrderStreamClient {
        let handler = OrderQueryHandler::new(Arc::new(store)).unwrap();
        let connection = Arc::new(MultiplexedConnection::connect(Arc::new(handler)));
        OrderStreamClient::new(connection).unwrap()
    }

    #[tokio::test]
    async fn decodes_orders_in_arrival_order() {
        let payloads = stream::iter(vec![payload(Order::new(2, 1)), payload(Order::new(2, 2))]);
        let orders: Vec<_> = DecodedOrders::new(payloads, 2).try_collect().await.unwrap();

        assert_eq!(orders, vec![Order::new(2, 1), Order::new(2, 2)]);
    }

    #[tokio::test]
    async fn foreign_order_is_terminal_error() {
        let payloads = stream::iter(vec![
            payload(Order::new(2, 1)),
            payload(Order::new(3, 1)),
            payload(Order::new(2, 2)),
        ]);
        let results: Vec<_> = DecodedOrders::new(payloads, 2).collect().await;

        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(TransportError::Domain(DomainError::ForeignOrder { owner: 3, .. }))
        ));
    }

    #[tokio::test]
    async fn undecodable_payload_is_terminal_error() {
        let payloads = stream::iter(vec![Ok(b"garbage".to_vec()), payload(Order::new(1, 1))]);
        let results: Vec<_> = DecodedOrders::new(payloads, 1).collect().await;

        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Err(TransportError::Decode(_))));
    }

    #[tokio::test]
    async fn streams_orders_from_remote_store() {
        let client = client_for(KeyedOrderStore::from_orders([
            (1, vec![Order::new(1, 1), Order::new(1, 2), Order::new(1, 3)]),
            (2, vec![]),
        ]));

        let one: Vec<_> = client.stream_orders(1).try_collect().await.unwrap();
        let two: Vec<_> = client.stream_orders(2).try_collect().await.unwrap();
        let absent: Vec<_> = client.stream_orders(42).try_collect().await.unwrap();

        assert_eq!(one, vec![Order::new(1, 1), Order::new(1, 2), Order::new(1, 3)]);
        assert!(two.is_empty());
        assert!(absent.is_empty());
    }

    #[tokio::test]
    async fn concurrent_requests_share_one_connection() {
        let client = client_for(KeyedOrderStore::from_orders(
            (1..=8).map(|id| (id, (1..=id).map(|n| Order::new(id, n)).collect())),
        ));

        let results = futures::future::join_all(
            (1..=8).map(|id| client.stream_orders(id).try_collect::<Vec<_>>()),
        )
        .await;

        for (index, result) in results.into_iter().enumerate() {
            let id = index as u32 + 1;
            let orders = result.unwrap();
            assert_eq!(orders.len(), id as usize);
            assert!(orders.iter().all(|o| o.customer_id == id));
        }
        assert_eq!(client.connection().active_streams(), 0);
    }

    #[tokio::test]
    async fn closed_connection_fails_without_retry() {
        let client = client_for(KeyedOrderStore::from_orders([(1, vec![Order::new(1, 1)])]));
        client.connection().close();

        let results: Vec<_> = client.stream_orders(1).collect().await;

        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Err(TransportError::ConnectionClosed)));
    }
}
