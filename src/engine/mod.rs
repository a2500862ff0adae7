pub mod error;
pub mod joiner;

// Re-export commonly used types
pub use error::EngineError;
pub use joiner::OrderJoiner;
