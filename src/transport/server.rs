use std::sync::Arc;

use dashmap::DashMap;
use futures::StreamExt;
use futures::stream::BoxStream;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::error::TransportError;
use super::frame::{Frame, StreamId};

/// Payloads produced by a handler for one request-stream
pub type PayloadStream = BoxStream<'static, Result<Vec<u8>, TransportError>>;

/// Responder side of a request-stream route
pub trait RequestHandler: Send + Sync + 'static {
    /// Start answering `route`; an `Err` is sent back as the stream's error frame
    fn request_stream(&self, route: &str) -> Result<PayloadStream, TransportError>;
}

/// Serve request-streams arriving on `inbound` until shutdown or disconnect
///
/// Each stream is answered by its own task, so a slow or failing stream
/// never holds up the others. `Cancel` frames stop the matching task.
/// Payloads are pushed without waiting for requester demand.
pub async fn serve<H>(
    handler: Arc<H>,
    mut inbound: UnboundedReceiver<Frame>,
    outbound: UnboundedSender<Frame>,
    shutdown: CancellationToken,
) where
    H: RequestHandler + ?Sized,
{
    let active: Arc<DashMap<StreamId, CancellationToken>> = Arc::new(DashMap::new());

    loop {
        let frame = tokio::select! {
            _ = shutdown.cancelled() => break,
            frame = inbound.recv() => match frame {
                Some(frame) => frame,
                None => break,
            },
        };

        match frame {
            Frame::RequestStream { stream_id, route } => {
                debug!(stream_id, route = %route, "Serving request stream");

                match handler.request_stream(&route) {
                    Ok(payloads) => {
                        // Registered before spawning so the task's own removal cannot race ahead
                        let token = shutdown.child_token();
                        active.insert(stream_id, token.clone());
                        tokio::spawn(respond(
                            stream_id,
                            payloads,
                            outbound.clone(),
                            token,
                            Arc::clone(&active),
                        ));
                    }
                    Err(e) => {
                        warn!(stream_id, route = %route, error = %e, "Request stream rejected");
                        let _ = outbound.send(Frame::Error {
                            stream_id,
                            message: e.to_string(),
                        });
                    }
                }
            }
            Frame::Cancel { stream_id } => {
                if let Some((_, token)) = active.remove(&stream_id) {
                    debug!(stream_id, "Request stream cancelled by requester");
                    token.cancel();
                }
            }
            other => {
                warn!(stream_id = other.stream_id(), frame = ?other, "Unexpected frame from requester");
            }
        }
    }

    for entry in active.iter() {
        entry.value().cancel();
    }
    debug!("Request stream server stopped");
}

async fn respond(
    stream_id: StreamId,
    mut payloads: PayloadStream,
    outbound: UnboundedSender<Frame>,
    token: CancellationToken,
    active: Arc<DashMap<StreamId, CancellationToken>>,
) {
    let terminal = loop {
        let next = tokio::select! {
            _ = token.cancelled() => None,
            item = payloads.next() => Some(item),
        };
        let Some(item) = next else {
            break None;
        };

        match item {
            Some(Ok(payload)) => {
                if outbound.send(Frame::Next { stream_id, payload }).is_err() {
                    break None;
                }
            }
            Some(Err(e)) => {
                break Some(Frame::Error {
                    stream_id,
                    message: e.to_string(),
                });
            }
            None => break Some(Frame::Complete { stream_id }),
        }
    };

    active.remove(&stream_id);
    if let Some(frame) = terminal {
        let _ = outbound.send(frame);
    }
}
