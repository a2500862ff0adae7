use thiserror::Error;

use crate::transport::TransportError;

/// Client-level errors
#[derive(Error, Debug)]
pub enum ClientError {
    /// The retry budget was consumed; carries the last transport failure
    #[error("Gave up after {attempts} attempts: {last}")]
    Exhausted {
        attempts: usize,
        #[source]
        last: TransportError,
    },
}
