use thiserror::Error;

use super::frame::StreamId;
use crate::domain::DomainError;
use crate::io::IoError;

/// Transport-level failures on either source
///
/// Every variant is a transport failure from the caller's point of view: the
/// customer reader retries on any of them, the order client surfaces them as
/// the terminal item of the affected per-key stream.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Remote error: {0}")]
    Remote(String),

    #[error("Stream id {0} already in use")]
    StreamIdInUse(StreamId),

    #[error("No handler for route: {0}")]
    UnknownRoute(String),

    #[error("Invalid route template: {0}")]
    InvalidRoute(String),

    #[error("Payload decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Source body error: {0}")]
    Io(#[from] IoError),

    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),
}

impl TransportError {
    /// Whether repeating the request could succeed
    ///
    /// Connection and remote failures are transient. Route, decode, domain
    /// and malformed-record failures repeat identically on every attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ConnectionClosed | Self::Remote(_) | Self::StreamIdInUse(_) => true,
            Self::Io(e) => e.is_transient(),
            Self::UnknownRoute(_) | Self::InvalidRoute(_) | Self::Decode(_) | Self::Domain(_) => {
                false
            }
        }
    }
}
