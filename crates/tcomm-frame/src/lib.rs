//! Wire codecs for the tcomm push-messaging protocol stack.
//!
//! Three nested layers, each with its own ASCII/hex encoding:
//! - **Tuning**: the once-per-session handshake frame (`… TUNE`)
//! - **Transport** ("Alpha"): sequenced, checksummed envelope (`… FABE`)
//! - **Gateway**: origin/destination routing (`GWM …`)
//!
//! Every header field is a fixed-width ASCII token followed by a single space.
//! Encoders size their buffer exactly and patch the checksum in last.

pub mod channel;
pub mod checksum;
pub mod codec;
pub mod cursor;
pub mod error;
pub mod gateway;
pub mod handler;
pub mod identity;
pub mod message;
pub mod transport;
pub mod tuning;

pub use channel::{
    channel_name, is_request_response, DEE_WEBSITE_MESSAGING, GW_CHANNEL, NAMED_CHANNELS,
};
pub use codec::HexCodec;
pub use cursor::{CursorBuffer, Delimiter};
pub use error::{FrameError, IdentityError, Result};
pub use gateway::{GatewayHandler, GATEWAY_MARKER};
pub use handler::Decoder;
pub use identity::{DeviceIdentity, Identity, ServiceIdentity};
pub use message::{GatewayMessage, Message, MESSAGE_TYPE, REQUEST_TYPE, RESPONSE_TYPE};
pub use transport::{
    TransportDecoder, TransportFrame, TransportHandler, TransportParams, TRANSPORT_FOOTER,
};
pub use tuning::{
    strip_parameter_prefixes, supported_protocols, TuningHandler, TuningOffer, PROTOCOL_ALPHA,
    TUNING_FOOTER,
};
