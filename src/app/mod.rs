pub mod cli;
pub mod config;
pub mod error;

// Re-export commonly used types
pub use cli::{CliApp, Writers, init_logging};
pub use config::GatewayConfig;
pub use error::AppError;
