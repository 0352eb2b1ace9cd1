use std::time::Duration;

/// Errors that can occur while running a push session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Frame-level error (encode failure or a fatal decode during handshake).
    #[error("frame error: {0}")]
    Frame(#[from] tcomm_frame::FrameError),

    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] tcomm_transport::TransportError),

    /// The gateway agreed to a protocol this client does not speak.
    #[error("protocol negotiation mismatch: expected '{expected}', got '{actual}'")]
    NegotiationMismatch { expected: String, actual: String },

    /// The gateway did not complete the handshake in time.
    #[error("handshake timed out after {0:?}")]
    HandshakeTimeout(Duration),

    /// The connection closed before the handshake completed.
    #[error("handshake aborted: {0}")]
    Aborted(String),

    /// An operation was attempted in the wrong lifecycle state.
    #[error("invalid session state: {0}")]
    InvalidState(String),

    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SessionError>;
