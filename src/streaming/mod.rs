pub mod aggregator;
pub mod error;

// Re-export commonly used types
pub use aggregator::{Aggregator, DEFAULT_CONCURRENCY, JoinedStream};
pub use error::{AbortOnError, FailurePolicy, IsolateErrors, SilentIsolate};
