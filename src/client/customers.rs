use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use futures::{StreamExt, stream};
use tracing::{debug, warn};

use super::error::ClientError;
use super::retry::RetryPolicy;
use super::traits::{CustomerBody, CustomerFeed, CustomerStream, CustomerTransport};
use crate::domain::Customer;
use crate::io::CsvCustomerStream;
use crate::transport::TransportError;

/// Fail-soft reader of the full customer list
///
/// Every transient transport failure, whether opening the request or
/// part-way through the body, is retried with exponential backoff. A
/// malformed record is logged and skipped; a permanent failure to open the
/// body ends the stream without retrying. Once the retry budget is
/// consumed the stream simply ends: callers see the customers delivered so
/// far (possibly none) and never an error.
pub struct CustomerSourceReader<T: CustomerTransport> {
    transport: Arc<T>,
    policy: RetryPolicy,
}

impl<T: CustomerTransport> CustomerSourceReader<T> {
    /// Create a reader with the default policy (10 retries from 1s)
    pub fn new(transport: T) -> Self {
        Self {
            transport: Arc::new(transport),
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

impl<T: CustomerTransport> CustomerFeed for CustomerSourceReader<T> {
    fn fetch_all(&self) -> CustomerStream {
        let state = FetchState {
            transport: Arc::clone(&self.transport),
            policy: self.policy.clone(),
            body: None,
            failures: 0,
            delivered: 0,
            skip: 0,
        };

        stream::unfold(state, |mut state| async move {
            let customer = state.next_customer().await?;
            Some((customer, state))
        })
        .boxed()
    }
}

struct FetchState<T: CustomerTransport> {
    transport: Arc<T>,
    policy: RetryPolicy,
    body: Option<CustomerBody>,
    failures: usize,
    delivered: usize,
    /// Records of a retried body already delivered by an earlier attempt
    skip: usize,
}

impl<T: CustomerTransport> FetchState<T> {
    async fn next_customer(&mut self) -> Option<Customer> {
        loop {
            let next = match self.body.as_mut() {
                Some(body) => body.next().await,
                None => {
                    match self.transport.open().await {
                        Ok(body) => {
                            self.skip = self.delivered;
                            self.body = Some(body);
                        }
                        Err(e) => {
                            if !self.back_off(e).await {
                                return None;
                            }
                        }
                    }
                    continue;
                }
            };

            match next {
                Some(Ok(customer)) => {
                    if self.skip > 0 {
                        self.skip -= 1;
                        continue;
                    }
                    self.delivered += 1;
                    return Some(customer);
                }
                Some(Err(e)) if !e.is_transient() => {
                    // Malformed record: re-reading yields the same failure
                    if self.skip == 0 {
                        warn!(error = %e, delivered = self.delivered, "Skipping malformed customer record");
                    }
                }
                Some(Err(e)) => {
                    self.body = None;
                    if !self.back_off(e).await {
                        return None;
                    }
                }
                None => {
                    debug!(delivered = self.delivered, "Customer fetch complete");
                    return None;
                }
            }
        }
    }

    /// Record a failure and sleep before the next attempt; false once exhausted
    async fn back_off(&mut self, error: TransportError) -> bool {
        if !error.is_transient() {
            warn!(error = %error, "Customer fetch failed permanently, not retrying");
            return false;
        }
        self.failures += 1;

        if !self.policy.should_retry(self.failures) {
            let exhausted = ClientError::Exhausted {
                attempts: self.failures,
                last: error,
            };
            warn!(
                error = %exhausted,
                delivered = self.delivered,
                "Customer fetch abandoned, continuing without remaining customers"
            );
            return false;
        }

        let delay = self.policy.delay_for_retry(self.failures);
        warn!(
            attempt = self.failures,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "Customer fetch failed, retrying"
        );
        tokio::time::sleep(delay).await;
        true
    }
}

/// Customer source serving a fixed list, as the seeded customer service does
#[derive(Debug, Clone)]
pub struct InMemoryCustomerTransport {
    customers: Arc<[Customer]>,
}

impl InMemoryCustomerTransport {
    pub fn new(customers: Vec<Customer>) -> Self {
        Self {
            customers: Arc::from(customers),
        }
    }

    /// The sample customers, ids 1..=7
    pub fn samples() -> Self {
        Self::new(Customer::samples())
    }
}

#[async_trait]
impl CustomerTransport for InMemoryCustomerTransport {
    async fn open(&self) -> Result<CustomerBody, TransportError> {
        let customers = Arc::clone(&self.customers);
        Ok(stream::iter(0..customers.len())
            .map(move |index| Ok(customers[index].clone()))
            .boxed())
    }
}

/// Customer source reading an `id,name` CSV body from disk on every request
#[derive(Debug, Clone)]
pub struct FileCustomerTransport {
    path: PathBuf,
}

impl FileCustomerTransport {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CustomerTransport for FileCustomerTransport {
    async fn open(&self) -> Result<CustomerBody, TransportError> {
        let body = CsvCustomerStream::from_file(&self.path).await?;
        Ok(body.map(|result| result.map_err(TransportError::from)).boxed())
    }
}
