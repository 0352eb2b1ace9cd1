//! Services the session calls out to when a push arrives.
//!
//! The session only knows these traits; `tcomm-fetch` provides HTTP
//! implementations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Error returned by a collaborator. The session logs it and moves on.
pub type CollaboratorError = Box<dyn std::error::Error + Send + Sync>;

/// Identifies one activity entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActivityKey {
    /// Activity entry id.
    pub id: String,
    /// Registered user the entry belongs to.
    pub user: String,
}

/// A resolved activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    /// The spoken text, when the activity description carries one.
    pub summary: Option<String>,
    /// The raw activity object with its description already parsed.
    pub activity: Value,
}

/// Notification status meaning active/running.
pub const STATUS_ON: &str = "ON";
/// Notification status meaning cancelled/dismissed.
pub const STATUS_OFF: &str = "OFF";
/// Timer status meaning paused.
pub const STATUS_PAUSED: &str = "PAUSED";

/// Full state of one timer, alarm or reminder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDetail {
    pub status: String,
    /// Milliseconds left on a timer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_time: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alarm_time: Option<i64>,
    /// `Timer`, `Alarm` or `Reminder`.
    #[serde(rename = "type")]
    pub notification_type: String,
    /// Every other field, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NotificationDetail {
    pub fn new(notification_type: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            remaining_time: None,
            alarm_time: None,
            notification_type: notification_type.into(),
            extra: Map::new(),
        }
    }

    pub fn with_remaining_time(mut self, millis: u64) -> Self {
        self.remaining_time = Some(millis);
        self
    }

    pub fn with_alarm_time(mut self, epoch_millis: i64) -> Self {
        self.alarm_time = Some(epoch_millis);
        self
    }
}

/// Resolves activity pushes into their content.
#[async_trait]
pub trait ActivitySource: Send + Sync {
    async fn fetch(&self, key: ActivityKey) -> Result<Activity, CollaboratorError>;
}

/// Resolves notification-change pushes into their full detail.
#[async_trait]
pub trait NotificationSource: Send + Sync {
    async fn fetch(&self, notification_id: &str) -> Result<NotificationDetail, CollaboratorError>;
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn notification_detail_parses_gateway_shape() {
        let detail: NotificationDetail = serde_json::from_value(json!({
            "type": "Timer",
            "status": "ON",
            "remainingTime": 60000,
            "deviceSerialNumber": "G090XX",
            "id": "abc"
        }))
        .unwrap();
        assert_eq!(detail.notification_type, "Timer");
        assert_eq!(detail.remaining_time, Some(60_000));
        assert_eq!(detail.alarm_time, None);
        assert_eq!(detail.extra["id"], "abc");
    }

    #[test]
    fn notification_detail_serializes_without_absent_times() {
        let value = serde_json::to_value(NotificationDetail::new("Alarm", STATUS_OFF)).unwrap();
        assert_eq!(value, json!({ "status": "OFF", "type": "Alarm" }));
    }
}
