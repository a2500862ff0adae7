use std::sync::Arc;

use futures::stream::{self, BoxStream};
use futures::{StreamExt, TryStreamExt};
use tracing::debug;

use super::error::{AbortOnError, FailurePolicy};
use crate::client::{CustomerFeed, OrderSource};
use crate::domain::CustomerOrder;
use crate::engine::{EngineError, OrderJoiner};

/// Default number of per-customer order fetches in flight at once
pub const DEFAULT_CONCURRENCY: usize = 16;

/// Joined records; an `Err` item is always the last one
pub type JoinedStream = BoxStream<'static, Result<CustomerOrder, EngineError>>;

/// Joins every customer from a feed with its orders
///
/// Order fetches run concurrently, at most `concurrency` at a time, so
/// records are emitted in completion order rather than customer order.
/// What happens when a fetch fails is decided by the failure policy;
/// the default [`AbortOnError`] ends the joined stream on the first failure.
///
/// # Example
/// ```rust,ignore
/// let aggregator = Aggregator::new(customer_reader, order_client)
///     .with_concurrency(8)
///     .with_failure_policy(IsolateErrors);
///
/// let mut joined = aggregator.joined_stream();
/// while let Some(record) = joined.next().await {
///     println!("{:?}", record?);
/// }
/// ```
pub struct Aggregator<C, O, P = AbortOnError>
where
    C: CustomerFeed,
    O: OrderSource + 'static,
    P: FailurePolicy + 'static,
{
    customers: C,
    joiner: Arc<OrderJoiner<O>>,
    policy: Arc<P>,
    concurrency: usize,
}

impl<C, O> Aggregator<C, O, AbortOnError>
where
    C: CustomerFeed,
    O: OrderSource + 'static,
{
    pub fn new(customers: C, orders: O) -> Self {
        Self {
            customers,
            joiner: Arc::new(OrderJoiner::new(orders)),
            policy: Arc::new(AbortOnError),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl<C, O, P> Aggregator<C, O, P>
where
    C: CustomerFeed,
    O: OrderSource + 'static,
    P: FailurePolicy + 'static,
{
    /// Set the maximum number of order fetches in flight (at least 1)
    ///
    /// With a concurrency of 1 records come out in customer order.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Replace the failure policy
    pub fn with_failure_policy<Q>(self, policy: Q) -> Aggregator<C, O, Q>
    where
        Q: FailurePolicy + 'static,
    {
        Aggregator {
            customers: self.customers,
            joiner: self.joiner,
            policy: Arc::new(policy),
            concurrency: self.concurrency,
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Lazily join every customer with its orders
    ///
    /// Dropping the returned stream cancels the customer fetch and every
    /// in-flight order request; no further requests are issued.
    pub fn joined_stream(&self) -> JoinedStream {
        let joiner = Arc::clone(&self.joiner);
        let joins = self
            .customers
            .fetch_all()
            .map(move |customer| {
                let joiner = Arc::clone(&joiner);
                async move { joiner.join(customer).await }
            })
            .buffer_unordered(self.concurrency);

        let policy = Arc::clone(&self.policy);
        stream::unfold(Some(joins), move |state| {
            let policy = Arc::clone(&policy);
            async move {
                // `None` once aborted; dropping `joins` cancels the remaining fetches
                let mut joins = state?;

                let Some(joined) = joins.next().await else {
                    debug!("Joined stream complete");
                    return None;
                };

                match joined {
                    Ok(record) => Some((Ok(record), Some(joins))),
                    Err(error) if policy.handle_order_error(&error) => {
                        let EngineError::OrderFetch { customer, source } = error;
                        let record = CustomerOrder::degraded(customer, source.to_string());
                        Some((Ok(record), Some(joins)))
                    }
                    Err(error) => Some((Err(error), None)),
                }
            }
        })
        .boxed()
    }

    /// Drain the joined stream into a list, failing on an aborting error
    pub async fn collect(&self) -> Result<Vec<CustomerOrder>, EngineError> {
        self.joined_stream().try_collect().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{CustomerStream, OrderStream};
    use crate::domain::{Customer, CustomerId, Order};
    use crate::streaming::error::{IsolateErrors, SilentIsolate};
    use crate::transport::TransportError;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct VecFeed(Vec<Customer>);

    impl CustomerFeed for VecFeed {
        fn fetch_all(&self) -> CustomerStream {
            stream::iter(self.0.clone()).boxed()
        }
    }

    struct EndlessFeed;

    impl CustomerFeed for EndlessFeed {
        fn fetch_all(&self) -> CustomerStream {
            stream::iter(1..)
                .map(|id| Customer::new(id, format!("customer-{id}")))
                .boxed()
        }
    }

    /// Decrements the in-flight counter when an order stream is dropped
    struct InFlight(Arc<AtomicUsize>);

    impl Drop for InFlight {
        fn drop(&mut self) {
            self.0.fetch_sub(1, Ordering::SeqCst);
        }
    }

    /// Yields `customer_id` orders per customer after a short delay; fails for listed ids
    #[derive(Default)]
    struct SlowOrders {
        failing: HashSet<CustomerId>,
        requests: Arc<AtomicUsize>,
        in_flight: Arc<AtomicUsize>,
        max_in_flight: Arc<AtomicUsize>,
    }

    impl SlowOrders {
        fn failing(ids: impl IntoIterator<Item = CustomerId>) -> Self {
            Self {
                failing: ids.into_iter().collect(),
                ..Self::default()
            }
        }
    }

    impl OrderSource for SlowOrders {
        fn stream_orders(&self, customer_id: CustomerId) -> OrderStream {
            self.requests.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            let guard = InFlight(Arc::clone(&self.in_flight));
            let fail = self.failing.contains(&customer_id);

            stream::once(tokio::time::sleep(Duration::from_millis(5)))
                .flat_map(move |_| {
                    let _held = &guard;
                    let mut items: Vec<Result<Order, TransportError>> = (1..=customer_id)
                        .map(|id| Ok(Order::new(customer_id, id)))
                        .collect();
                    if fail {
                        items.push(Err(TransportError::Remote("store unavailable".to_string())));
                    }
                    stream::iter(items)
                })
                .boxed()
        }
    }

    fn customers(n: u32) -> Vec<Customer> {
        (1..=n).map(|id| Customer::new(id, format!("customer-{id}"))).collect()
    }

    #[tokio::test]
    async fn joins_two_customers_as_a_set() {
        struct TwoCustomerOrders;

        impl OrderSource for TwoCustomerOrders {
            fn stream_orders(&self, customer_id: CustomerId) -> OrderStream {
                match customer_id {
                    1 => stream::iter(vec![Ok(Order::new(1, 1))]).boxed(),
                    _ => stream::empty().boxed(),
                }
            }
        }

        let feed = VecFeed(vec![Customer::new(1, "Josh"), Customer::new(2, "Yuxin")]);
        let records = Aggregator::new(feed, TwoCustomerOrders).collect().await.unwrap();

        let joined: HashSet<_> = records
            .into_iter()
            .map(|r| (r.customer.name, r.orders))
            .collect();
        let expected: HashSet<_> = [
            ("Josh".to_string(), vec![Order::new(1, 1)]),
            ("Yuxin".to_string(), vec![]),
        ]
        .into_iter()
        .collect();

        assert_eq!(joined, expected);
    }

    #[tokio::test]
    async fn emits_exactly_one_record_per_customer() {
        let records = Aggregator::new(VecFeed(customers(20)), SlowOrders::default())
            .with_concurrency(4)
            .collect()
            .await
            .unwrap();

        assert_eq!(records.len(), 20);
        let ids: HashSet<_> = records.iter().map(|r| r.customer.id).collect();
        assert_eq!(ids.len(), 20);
        for record in &records {
            assert_eq!(record.orders.len(), record.customer.id as usize);
            assert!(record.orders.iter().all(|o| o.customer_id == record.customer.id));
        }
    }

    #[tokio::test]
    async fn respects_concurrency_limit() {
        let orders = SlowOrders::default();
        let max_in_flight = Arc::clone(&orders.max_in_flight);

        let records = Aggregator::new(VecFeed(customers(12)), orders)
            .with_concurrency(3)
            .collect()
            .await
            .unwrap();

        assert_eq!(records.len(), 12);
        assert!(max_in_flight.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn concurrency_of_one_preserves_customer_order() {
        let records = Aggregator::new(VecFeed(customers(6)), SlowOrders::default())
            .with_concurrency(1)
            .collect()
            .await
            .unwrap();

        let ids: Vec<_> = records.iter().map(|r| r.customer.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);
    }

    #[tokio::test]
    async fn zero_concurrency_is_clamped_to_one() {
        let aggregator = Aggregator::new(VecFeed(vec![]), SlowOrders::default()).with_concurrency(0);
        assert_eq!(aggregator.concurrency(), 1);
    }

    #[tokio::test]
    async fn empty_feed_yields_empty_stream() {
        let records = Aggregator::new(VecFeed(vec![]), SlowOrders::default())
            .collect()
            .await
            .unwrap();

        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn abort_on_error_ends_stream_with_single_error() {
        let aggregator = Aggregator::new(VecFeed(customers(8)), SlowOrders::failing([3]))
            .with_concurrency(2);

        let items: Vec<_> = aggregator.joined_stream().collect().await;
        let errors: Vec<_> = items.iter().filter(|r| r.is_err()).collect();

        assert_eq!(errors.len(), 1);
        assert!(items.last().unwrap().is_err());
        assert!(items.len() < 8 + 1);
        match items.last().unwrap() {
            Err(EngineError::OrderFetch { customer, .. }) => assert_eq!(customer.id, 3),
            Ok(_) => panic!("Expected OrderFetch error"),
        }
    }

    #[tokio::test]
    async fn abort_cancels_remaining_fetches() {
        let orders = SlowOrders::failing([1]);
        let in_flight = Arc::clone(&orders.in_flight);

        let result = Aggregator::new(VecFeed(customers(8)), orders)
            .with_concurrency(4)
            .collect()
            .await;

        assert!(result.is_err());
        assert_eq!(in_flight.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn isolate_errors_emits_degraded_record() {
        let records = Aggregator::new(VecFeed(customers(5)), SlowOrders::failing([2, 4]))
            .with_failure_policy(IsolateErrors)
            .collect()
            .await
            .unwrap();

        assert_eq!(records.len(), 5);
        for record in &records {
            let failed = matches!(record.customer.id, 2 | 4);
            assert_eq!(record.is_degraded(), failed);
            if failed {
                assert!(record.orders.is_empty());
                assert!(record.error.as_deref().unwrap().contains("store unavailable"));
            } else {
                assert_eq!(record.orders.len(), record.customer.id as usize);
            }
        }
    }

    #[tokio::test]
    async fn silent_isolate_never_fails() {
        let records = Aggregator::new(VecFeed(customers(3)), SlowOrders::failing([1, 2, 3]))
            .with_failure_policy(SilentIsolate)
            .collect()
            .await
            .unwrap();

        assert_eq!(records.len(), 3);
        assert!(records.iter().all(CustomerOrder::is_degraded));
    }

    #[tokio::test]
    async fn dropping_joined_stream_stops_new_requests() {
        let orders = SlowOrders::default();
        let requests = Arc::clone(&orders.requests);
        let in_flight = Arc::clone(&orders.in_flight);
        let aggregator = Aggregator::new(EndlessFeed, orders).with_concurrency(4);

        let mut joined = aggregator.joined_stream();
        for _ in 0..3 {
            assert!(joined.next().await.unwrap().is_ok());
        }
        drop(joined);

        let issued = requests.load(Ordering::SeqCst);
        assert!(issued <= 3 + 4);
        assert_eq!(in_flight.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(requests.load(Ordering::SeqCst), issued);
    }
}
