use std::io;
use thiserror::Error;

/// IO-level errors for reading customer bodies and writing joined output
#[derive(Error, Debug)]
pub enum IoError {
    #[error("CSV async parsing error: {0}")]
    CsvAsync(#[from] csv_async::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}

impl IoError {
    /// Whether re-reading could succeed; malformed records fail the same way every time
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Io(_) => true,
            Self::CsvAsync(e) => e.is_io_error(),
            Self::Json(_) | Self::InvalidRecord(_) => false,
        }
    }
}
