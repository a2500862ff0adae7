use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::Stream;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::error::TransportError;
use super::frame::{Frame, StreamId};
use super::server::{RequestHandler, serve};

type Delivery = Result<Vec<u8>, TransportError>;

/// Registry of open request-streams, keyed by stream id
type StreamRegistry = DashMap<StreamId, UnboundedSender<Delivery>>;

/// A persistent connection carrying many concurrent request-streams
///
/// Requests are independent: each gets its own stream id and delivery
/// channel, and a failure on one stream never touches another. Closing the
/// connection fails every pending stream with
/// [`TransportError::ConnectionClosed`].
///
/// There is no flow control: delivery channels are unbounded and the
/// responder sends every payload as soon as it is produced, whatever the
/// requester's read rate. Suited to short, bounded responses.
pub struct MultiplexedConnection {
    outbound: UnboundedSender<Frame>,
    streams: Arc<StreamRegistry>,
    next_stream_id: AtomicU64,
    shutdown: CancellationToken,
}

impl MultiplexedConnection {
    /// Open an in-process connection whose remote end is served by `handler`
    ///
    /// Must be called from within a tokio runtime.
    pub fn connect<H>(handler: Arc<H>) -> Self
    where
        H: RequestHandler + ?Sized,
    {
        let (client_out, server_in) = mpsc::unbounded_channel();
        let (server_out, client_in) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();

        tokio::spawn(serve(handler, server_in, server_out, shutdown.child_token()));

        Self::from_channels(client_out, client_in, shutdown)
    }

    /// Attach to an existing pair of frame channels
    pub fn from_channels(
        outbound: UnboundedSender<Frame>,
        inbound: UnboundedReceiver<Frame>,
        shutdown: CancellationToken,
    ) -> Self {
        let streams = Arc::new(StreamRegistry::new());
        tokio::spawn(demultiplex(inbound, Arc::clone(&streams), shutdown.clone()));

        Self {
            outbound,
            streams,
            // Requester-initiated ids are odd
            next_stream_id: AtomicU64::new(1),
            shutdown,
        }
    }

    /// Open a request-stream on `route`
    pub fn request_stream(&self, route: impl Into<String>) -> Result<ResponseStream, TransportError> {
        if self.shutdown.is_cancelled() {
            return Err(TransportError::ConnectionClosed);
        }

        let route = route.into();
        let stream_id = self.next_stream_id.fetch_add(2, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        match self.streams.entry(stream_id) {
            Entry::Occupied(_) => return Err(TransportError::StreamIdInUse(stream_id)),
            Entry::Vacant(slot) => {
                slot.insert(tx);
            }
        }

        // Re-check after registering: a concurrent close may already have drained the registry
        if self.shutdown.is_cancelled()
            || self
                .outbound
                .send(Frame::RequestStream {
                    stream_id,
                    route: route.clone(),
                })
                .is_err()
        {
            self.streams.remove(&stream_id);
            return Err(TransportError::ConnectionClosed);
        }

        debug!(stream_id, route = %route, "Request stream opened");
        Ok(ResponseStream {
            stream_id,
            inbound: rx,
            outbound: self.outbound.clone(),
            streams: Arc::clone(&self.streams),
            finished: false,
        })
    }

    /// Number of request-streams still awaiting completion
    pub fn active_streams(&self) -> usize {
        self.streams.len()
    }

    pub fn is_closed(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Close the connection, failing all pending streams
    pub fn close(&self) {
        self.shutdown.cancel();
    }
}

impl Drop for MultiplexedConnection {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Route inbound frames to the delivery channel of their stream
async fn demultiplex(
    mut inbound: UnboundedReceiver<Frame>,
    streams: Arc<StreamRegistry>,
    shutdown: CancellationToken,
) {
    loop {
        let frame = tokio::select! {
            _ = shutdown.cancelled() => break,
            frame = inbound.recv() => match frame {
                Some(frame) => frame,
                None => break,
            },
        };

        match frame {
            Frame::Next { stream_id, payload } => {
                // A missing entry means the requester already cancelled
                if let Some(sender) = streams.get(&stream_id) {
                    let _ = sender.send(Ok(payload));
                }
            }
            Frame::Complete { stream_id } => {
                streams.remove(&stream_id);
            }
            Frame::Error { stream_id, message } => {
                if let Some((_, sender)) = streams.remove(&stream_id) {
                    let _ = sender.send(Err(TransportError::Remote(message)));
                }
            }
            other => {
                warn!(stream_id = other.stream_id(), frame = ?other, "Unexpected frame from responder");
            }
        }
    }

    shutdown.cancel();

    let pending: Vec<StreamId> = streams.iter().map(|entry| *entry.key()).collect();
    for stream_id in pending {
        if let Some((_, sender)) = streams.remove(&stream_id) {
            let _ = sender.send(Err(TransportError::ConnectionClosed));
        }
    }
    debug!("Connection closed");
}

/// Payloads of one request-stream
///
/// Yields payloads in the order the responder sent them. A failure is
/// delivered once as the final item. Dropping the stream before it finishes
/// sends `Cancel` to the responder.
pub struct ResponseStream {
    stream_id: StreamId,
    inbound: UnboundedReceiver<Delivery>,
    outbound: UnboundedSender<Frame>,
    streams: Arc<StreamRegistry>,
    finished: bool,
}

impl std::fmt::Debug for ResponseStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseStream")
            .field("stream_id", &self.stream_id)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl ResponseStream {
    pub fn stream_id(&self) -> StreamId {
        self.stream_id
    }
}

impl Stream for ResponseStream {
    type Item = Result<Vec<u8>, TransportError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.finished {
            return Poll::Ready(None);
        }

        match this.inbound.poll_recv(cx) {
            Poll::Ready(Some(Ok(payload))) => Poll::Ready(Some(Ok(payload))),
            Poll::Ready(Some(Err(e))) => {
                this.finished = true;
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                this.finished = true;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for ResponseStream {
    fn drop(&mut self) {
        if !self.finished && self.streams.remove(&self.stream_id).is_some() {
            debug!(stream_id = self.stream_id, "Request stream dropped, cancelling");
            let _ = self.outbound.send(Frame::Cancel {
                stream_id: self.stream_id,
            });
        }
    }
}
