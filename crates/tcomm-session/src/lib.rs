//! Push-gateway sessions for tcomm.
//!
//! A [`Session`] owns one connection's protocol state: the tuning handshake,
//! the ordered frame listeners, timers and alarms. It never touches the
//! socket itself. Outbound frames go to a [`tcomm_transport::FrameSink`] and
//! inbound transport events are fed in by [`driver::run`].
//!
//! Consumers observe the session through [`SessionEvent`]s from
//! [`Session::subscribe`].

pub mod collaborator;
pub mod command;
pub mod config;
pub mod driver;
pub mod error;
pub mod event;
pub mod registry;
pub mod session;

pub use collaborator::{
    Activity, ActivityKey, ActivitySource, CollaboratorError, NotificationDetail,
    NotificationSource, STATUS_OFF, STATUS_ON, STATUS_PAUSED,
};
pub use command::{
    Command, NotificationChange, PUSH_ACTIVITY, PUSH_NOTIFICATION_CHANGE, REGISTER_CONNECTION,
};
pub use config::{SessionConfig, DEVICE_ENDPOINT_URN, WEB_MESSAGING_ENDPOINT_URN};
pub use driver::run;
pub use error::{Result, SessionError};
pub use event::SessionEvent;
pub use registry::ListenerToken;
pub use session::{AlarmState, InputReceiver, Session, SessionInput, SessionState};
