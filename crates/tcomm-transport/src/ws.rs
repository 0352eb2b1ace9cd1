use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::header::{COOKIE, ORIGIN};
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::config::ConnectConfig;
use crate::error::{Result, TransportError};
use crate::traits::{EventSource, FrameSink, TransportEvent};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Close code for an orderly client-initiated shutdown.
pub const CLOSE_NORMAL: u16 = 1000;
/// Close code reported when the peer sent a close frame without a status.
pub const CLOSE_NO_STATUS: u16 = 1005;
/// Close code reported when the socket ended without a close frame.
pub const CLOSE_ABNORMAL: u16 = 1006;

/// Build the WebSocket upgrade request with `Cookie` and `Origin` headers.
pub fn build_request(config: &ConnectConfig) -> Result<Request> {
    let url = config.url()?;
    let mut request = url
        .as_str()
        .into_client_request()
        .map_err(|err| TransportError::Connect {
            url: url.to_string(),
            source: Box::new(err),
        })?;

    let mut cookie = header_value("Cookie", &config.cookie)?;
    cookie.set_sensitive(true);
    let headers = request.headers_mut();
    headers.insert(COOKIE, cookie);
    headers.insert(ORIGIN, header_value("Origin", &config.origin)?);
    Ok(request)
}

fn header_value(name: &'static str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|err| TransportError::Header {
        name,
        reason: err.to_string(),
    })
}

/// Connect to the push gateway described by `config`.
pub async fn connect(config: &ConnectConfig) -> Result<(WsSender, WsReceiver)> {
    info!(host = %config.push_host, serial = %config.serial, "connecting to push gateway");
    connect_request(build_request(config)?).await
}

/// Connect using a prepared upgrade request.
pub async fn connect_request(request: Request) -> Result<(WsSender, WsReceiver)> {
    let url = request.uri().to_string();
    let (stream, response) =
        tokio_tungstenite::connect_async(request)
            .await
            .map_err(|err| TransportError::Connect {
                url: url.clone(),
                source: Box::new(err),
            })?;
    debug!(status = %response.status(), %url, "websocket upgraded");

    let (sink, stream) = stream.split();
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(write_loop(sink, rx));

    Ok((
        WsSender { tx },
        WsReceiver {
            stream,
            opened: false,
            finished: false,
        },
    ))
}

async fn write_loop(
    mut sink: SplitSink<WsStream, WsMessage>,
    mut rx: mpsc::UnboundedReceiver<Bytes>,
) {
    while let Some(frame) = rx.recv().await {
        if let Err(err) = sink.send(WsMessage::Binary(frame)).await {
            warn!(%err, "websocket write failed");
            return;
        }
    }
    // All senders dropped.
    if let Err(err) = sink.close().await {
        debug!(%err, "websocket close failed");
    }
}

/// Outbound half of a push gateway connection. Cheap to clone.
///
/// Frames are queued to a writer task; dropping every sender closes the
/// socket.
#[derive(Debug, Clone)]
pub struct WsSender {
    tx: mpsc::UnboundedSender<Bytes>,
}

impl WsSender {
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl FrameSink for WsSender {
    fn send_frame(&mut self, frame: Bytes) -> Result<()> {
        self.tx.send(frame).map_err(|_| TransportError::Closed)
    }
}

/// Inbound half of a push gateway connection.
pub struct WsReceiver {
    stream: SplitStream<WsStream>,
    opened: bool,
    finished: bool,
}

impl WsReceiver {
    /// Next connection event. Starts with [`TransportEvent::Open`] and ends
    /// after the first `Close` or `Error`.
    pub async fn recv_event(&mut self) -> Option<TransportEvent> {
        if !self.opened {
            self.opened = true;
            return Some(TransportEvent::Open);
        }
        if self.finished {
            return None;
        }
        loop {
            let event = match self.stream.next().await {
                Some(Ok(WsMessage::Binary(data))) => TransportEvent::Message(data),
                Some(Ok(WsMessage::Text(text))) => {
                    TransportEvent::Message(Bytes::copy_from_slice(text.as_str().as_bytes()))
                }
                Some(Ok(WsMessage::Close(frame))) => {
                    self.finished = true;
                    let (code, reason) = frame.map_or((CLOSE_NO_STATUS, String::new()), |frame| {
                        (u16::from(frame.code), frame.reason.as_str().to_owned())
                    });
                    TransportEvent::Close { code, reason }
                }
                // Ping/pong are answered by tungstenite.
                Some(Ok(_)) => continue,
                Some(Err(err)) => {
                    self.finished = true;
                    TransportEvent::Error(err.to_string())
                }
                None => {
                    self.finished = true;
                    TransportEvent::Close {
                        code: CLOSE_ABNORMAL,
                        reason: "connection dropped".to_string(),
                    }
                }
            };
            return Some(event);
        }
    }
}

#[async_trait]
impl EventSource for WsReceiver {
    async fn next_event(&mut self) -> Option<TransportEvent> {
        self.recv_event().await
    }
}

impl std::fmt::Debug for WsReceiver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsReceiver")
            .field("opened", &self.opened)
            .field("finished", &self.finished)
            .finish()
    }
}
