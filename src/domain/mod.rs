pub mod customer;
pub mod error;
pub mod order;

// Re-export commonly used types
pub use customer::{Customer, CustomerId, SAMPLE_CUSTOMER_NAMES};
pub use error::DomainError;
pub use order::{CustomerOrder, Order, OrderId};
