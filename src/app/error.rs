use thiserror::Error;

use crate::engine::EngineError;
use crate::io::IoError;
use crate::storage::StorageError;
use crate::transport::TransportError;

/// Top-level application errors unifying all layer errors
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Output error: {0}")]
    Output(#[from] IoError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
}
