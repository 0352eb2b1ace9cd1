use std::sync::Arc;

use serde_json::{json, Value};

use crate::collaborator::{Activity, NotificationDetail};
use crate::command::Command;
use crate::error::SessionError;

/// Something a session consumer may want to react to.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The transport opened; the handshake is starting.
    Open,
    /// The register command went out; pushes will now arrive.
    Ready,
    /// Every gateway command, before dispatch.
    Command(Command),
    Activity(Activity),
    TimerStart(NotificationDetail),
    TimerPause(NotificationDetail),
    TimerRemove(NotificationDetail),
    TimerComplete(NotificationDetail),
    AlarmSet(NotificationDetail),
    AlarmUpdate(NotificationDetail),
    AlarmRemove(NotificationDetail),
    /// A fatal session error. The session is closed afterwards.
    Error(Arc<SessionError>),
    Close { code: u16, reason: String },
}

impl SessionEvent {
    /// Stable event name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Ready => "ready",
            Self::Command(_) => "command",
            Self::Activity(_) => "activity",
            Self::TimerStart(_) => "timerStart",
            Self::TimerPause(_) => "timerPause",
            Self::TimerRemove(_) => "timerRemove",
            Self::TimerComplete(_) => "timerComplete",
            Self::AlarmSet(_) => "alarmSet",
            Self::AlarmUpdate(_) => "alarmUpdate",
            Self::AlarmRemove(_) => "alarmRemove",
            Self::Error(_) => "error",
            Self::Close { .. } => "close",
        }
    }

    /// Event data as JSON (`null` for events without data).
    pub fn data(&self) -> Value {
        match self {
            Self::Open | Self::Ready => Value::Null,
            Self::Command(command) => serde_json::to_value(command).unwrap_or(Value::Null),
            Self::Activity(activity) => serde_json::to_value(activity).unwrap_or(Value::Null),
            Self::TimerStart(detail)
            | Self::TimerPause(detail)
            | Self::TimerRemove(detail)
            | Self::TimerComplete(detail)
            | Self::AlarmSet(detail)
            | Self::AlarmUpdate(detail)
            | Self::AlarmRemove(detail) => serde_json::to_value(detail).unwrap_or(Value::Null),
            Self::Error(err) => json!({ "message": err.to_string() }),
            Self::Close { code, reason } => json!({ "code": code, "reason": reason }),
        }
    }

    /// `{"event": <name>, "data": <data>}`.
    pub fn to_json(&self) -> Value {
        json!({ "event": self.name(), "data": self.data() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_match_wire_vocabulary() {
        assert_eq!(SessionEvent::Open.name(), "open");
        assert_eq!(
            SessionEvent::TimerComplete(NotificationDetail::new("Timer", "ON")).name(),
            "timerComplete"
        );
        assert_eq!(
            SessionEvent::Close {
                code: 1000,
                reason: String::new()
            }
            .name(),
            "close"
        );
    }

    #[test]
    fn json_rendering() {
        let event = SessionEvent::Close {
            code: 1006,
            reason: "gone".to_string(),
        };
        assert_eq!(
            event.to_json(),
            json!({ "event": "close", "data": { "code": 1006, "reason": "gone" } })
        );

        let event = SessionEvent::Error(Arc::new(SessionError::Aborted("closed".into())));
        assert_eq!(
            event.data(),
            json!({ "message": "handshake aborted: closed" })
        );
    }
}
