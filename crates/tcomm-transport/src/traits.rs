use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use crate::error::Result;

/// Outbound half of a connection: hands one encoded frame to the socket.
///
/// Implementations must not block; the session calls this from its own task.
pub trait FrameSink {
    fn send_frame(&mut self, frame: Bytes) -> Result<()>;
}

impl<T: FrameSink + ?Sized> FrameSink for Box<T> {
    fn send_frame(&mut self, frame: Bytes) -> Result<()> {
        (**self).send_frame(frame)
    }
}

/// Inbound connection lifecycle, in the order the socket produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The WebSocket upgrade completed.
    Open,
    /// One complete WebSocket message.
    Message(Bytes),
    /// The peer closed the connection.
    Close { code: u16, reason: String },
    /// The connection failed.
    Error(String),
}

/// Inbound half of a connection.
#[async_trait]
pub trait EventSource: Send {
    /// Next event, or `None` once the connection is finished.
    async fn next_event(&mut self) -> Option<TransportEvent>;
}

#[async_trait]
impl EventSource for mpsc::UnboundedReceiver<TransportEvent> {
    async fn next_event(&mut self) -> Option<TransportEvent> {
        self.recv().await
    }
}

#[async_trait]
impl EventSource for mpsc::Receiver<TransportEvent> {
    async fn next_event(&mut self) -> Option<TransportEvent> {
        self.recv().await
    }
}
