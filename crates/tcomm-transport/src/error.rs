/// Errors that can occur in the WebSocket transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The push endpoint URL could not be built.
    #[error("invalid push url: {0}")]
    Url(#[from] url::ParseError),

    /// A configured header value is not a valid HTTP header.
    #[error("invalid {name} header: {reason}")]
    Header { name: &'static str, reason: String },

    /// The WebSocket connection could not be established.
    #[error("failed to connect to {url}: {source}")]
    Connect {
        url: String,
        source: Box<tokio_tungstenite::tungstenite::Error>,
    },

    /// A frame could not be written to the socket.
    #[error("failed to send frame: {0}")]
    Send(String),

    /// The established connection failed.
    #[error("socket error: {0}")]
    Socket(String),

    /// The connection has been closed.
    #[error("transport closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, TransportError>;
