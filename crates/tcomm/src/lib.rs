//! Client for a cloud push-messaging gateway.
//!
//! tcomm speaks the gateway's layered wire protocol over a WebSocket: a
//! tuning handshake, the fragmenting "Alpha" transport and URN-addressed
//! gateway messages carrying JSON push commands.
//!
//! # Crate Structure
//!
//! - [`transport`] : WebSocket connection and the frame sink / event seams
//! - [`frame`] : Wire codec for the tuning, transport and gateway layers
//! - [`session`] : Handshake, listener dispatch, timers and alarms (behind `session` feature)
//! - [`fetch`] : HTTP activity and notification lookups (behind `fetch` feature)

/// Re-export transport types.
pub mod transport {
    pub use tcomm_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use tcomm_frame::*;
}

/// Re-export session types (requires `session` feature).
#[cfg(feature = "session")]
pub mod session {
    pub use tcomm_session::*;
}

/// Re-export HTTP lookup types (requires `fetch` feature).
#[cfg(feature = "fetch")]
pub mod fetch {
    pub use tcomm_fetch::*;
}
