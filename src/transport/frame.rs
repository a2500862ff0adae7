/// Connection-local identifier of one request-stream
pub type StreamId = u64;

/// Frames exchanged over a multiplexed connection
///
/// A requester opens a stream with `RequestStream`; the responder answers
/// with zero or more `Next` frames followed by exactly one of `Complete` or
/// `Error`. The requester may send `Cancel` at any time before that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    RequestStream { stream_id: StreamId, route: String },
    Next { stream_id: StreamId, payload: Vec<u8> },
    Complete { stream_id: StreamId },
    Error { stream_id: StreamId, message: String },
    Cancel { stream_id: StreamId },
}

impl Frame {
    /// Get the stream this frame belongs to
    pub fn stream_id(&self) -> StreamId {
        match self {
            Self::RequestStream { stream_id, .. } => *stream_id,
            Self::Next { stream_id, .. } => *stream_id,
            Self::Complete { stream_id } => *stream_id,
            Self::Error { stream_id, .. } => *stream_id,
            Self::Cancel { stream_id } => *stream_id,
        }
    }
}
