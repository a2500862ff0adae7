pub mod customers;
pub mod error;
pub mod orders;
pub mod retry;
pub mod traits;

// Re-export commonly used types
pub use customers::{CustomerSourceReader, FileCustomerTransport, InMemoryCustomerTransport};
pub use error::ClientError;
pub use orders::{DecodedOrders, OrderStreamClient};
pub use retry::{DEFAULT_INITIAL_DELAY, DEFAULT_MAX_RETRIES, RetryPolicy};
pub use traits::{
    CustomerBody, CustomerFeed, CustomerStream, CustomerTransport, OrderSource, OrderStream,
};
