use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::collaborator::ActivityKey;
use crate::error::Result;

/// Command sent once the transport is negotiated.
pub const REGISTER_CONNECTION: &str = "REGISTER_CONNECTION";
/// A new activity (voice interaction) is available.
pub const PUSH_ACTIVITY: &str = "PUSH_ACTIVITY";
/// A timer, alarm or reminder changed.
pub const PUSH_NOTIFICATION_CHANGE: &str = "PUSH_NOTIFICATION_CHANGE";

/// JSON command envelope carried in gateway payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub command: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub payload: Value,
}

impl Command {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            payload: Value::Null,
        }
    }

    /// Parse the payload as `T`.
    ///
    /// The gateway usually sends the payload as a JSON document encoded in a
    /// string; an inline object is accepted as well.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T> {
        let parsed = match &self.payload {
            Value::String(text) => serde_json::from_str(text)?,
            other => T::deserialize(other)?,
        };
        Ok(parsed)
    }

    pub fn activity_key(&self) -> Result<ActivityKey> {
        let push: ActivityPush = self.payload_as()?;
        Ok(ActivityKey {
            id: push.key.entry_id,
            user: push.key.registered_user_id,
        })
    }

    pub fn notification_change(&self) -> Result<NotificationChange> {
        self.payload_as()
    }
}

#[derive(Debug, Deserialize)]
struct ActivityPush {
    key: ActivityPushKey,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActivityPushKey {
    registered_user_id: String,
    entry_id: String,
}

/// Payload of a `PUSH_NOTIFICATION_CHANGE` command.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationChange {
    pub notification_id: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::SessionError;

    #[test]
    fn activity_key_from_string_payload() {
        let command: Command = serde_json::from_value(json!({
            "command": "PUSH_ACTIVITY",
            "payload": "{\"destinationUserId\":\"A1\",\"key\":{\"registeredUserId\":\"U1\",\"entryId\":\"E1\"}}"
        }))
        .unwrap();
        assert_eq!(
            command.activity_key().unwrap(),
            ActivityKey {
                id: "E1".to_string(),
                user: "U1".to_string()
            }
        );
    }

    #[test]
    fn notification_change_from_object_payload() {
        let command: Command = serde_json::from_value(json!({
            "command": "PUSH_NOTIFICATION_CHANGE",
            "payload": { "notificationId": "n-1", "status": "ON", "eventType": "CREATE" }
        }))
        .unwrap();
        let change = command.notification_change().unwrap();
        assert_eq!(change.notification_id, "n-1");
        assert_eq!(change.status.as_deref(), Some("ON"));
    }

    #[test]
    fn malformed_payload_is_a_json_error() {
        let command = Command {
            command: PUSH_ACTIVITY.to_string(),
            payload: Value::String("{not json".to_string()),
        };
        assert!(matches!(command.activity_key(), Err(SessionError::Json(_))));
    }

    #[test]
    fn register_command_serializes_without_payload() {
        let text = serde_json::to_string(&Command::new(REGISTER_CONNECTION)).unwrap();
        assert_eq!(text, r#"{"command":"REGISTER_CONNECTION"}"#);
    }
}
