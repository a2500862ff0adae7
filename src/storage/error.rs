use thiserror::Error;

/// Storage-level errors raised while populating the order store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("Customer id range {start}..={end} is empty")]
    EmptyIdRange { start: u32, end: u32 },

    #[error("Order count bound must be at least 1, got {0}")]
    InvalidOrderBound(u32),
}
