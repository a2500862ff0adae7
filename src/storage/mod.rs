pub mod error;
pub mod order_store;
pub mod query_handler;
pub mod traits;

// Re-export commonly used types
pub use error::StorageError;
pub use order_store::{
    DEFAULT_CUSTOMER_IDS, DEFAULT_MAX_ORDERS_PER_CUSTOMER, KeyedOrderStore, OrderStoreConfig,
};
pub use query_handler::OrderQueryHandler;
pub use traits::OrderLookup;
