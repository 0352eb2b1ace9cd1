//! WebSocket transport for the tcomm push-messaging client.
//!
//! The lowest layer of tcomm. Opens the `wss://` session to the push gateway
//! and exposes it as a [`FrameSink`] for outbound frames plus a stream of
//! [`TransportEvent`]s for everything inbound.

pub mod config;
pub mod error;
pub mod traits;
pub mod ws;

pub use config::{ConnectConfig, DEFAULT_DEVICE_TYPE, DEFAULT_ORIGIN, DEFAULT_PUSH_HOST};
pub use error::{Result, TransportError};
pub use traits::{EventSource, FrameSink, TransportEvent};
pub use ws::{
    build_request, connect, connect_request, WsReceiver, WsSender, CLOSE_ABNORMAL, CLOSE_NORMAL,
    CLOSE_NO_STATUS,
};
