use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tcomm_session::{CollaboratorError, NotificationDetail, NotificationSource};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::client::{AjaxClient, FetchConfig};
use crate::error::{FetchError, Result};

/// Device that owns the account's notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDevice {
    pub device_type: String,
    pub device_serial_number: String,
}

impl NotificationDevice {
    /// Path segment of one notification: `<deviceType>-<serial>-<id>`.
    pub fn notification_path(&self, notification_id: &str) -> String {
        format!(
            "{}-{}-{}",
            self.device_type, self.device_serial_number, notification_id
        )
    }
}

/// Resolves `PUSH_NOTIFICATION_CHANGE` ids through `/api/notifications`.
///
/// Notification URLs embed the owning device, which is only learned from the
/// notification list. Call [`bootstrap`](Self::bootstrap) before the first
/// fetch.
#[derive(Debug)]
pub struct NotificationFetcher {
    client: AjaxClient,
    device: RwLock<Option<NotificationDevice>>,
}

impl NotificationFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        Ok(Self {
            client: AjaxClient::new(config)?,
            device: RwLock::new(None),
        })
    }

    /// Learn the device from the first listed notification.
    pub async fn bootstrap(&self) -> Result<NotificationDevice> {
        let body = self.client.get_json(&["api", "notifications"]).await?;
        let device = first_device(&body)?;
        info!(
            device_type = %device.device_type,
            serial = %device.device_serial_number,
            "notification device discovered"
        );
        *self.device.write().await = Some(device.clone());
        Ok(device)
    }

    pub async fn device(&self) -> Option<NotificationDevice> {
        self.device.read().await.clone()
    }

    pub async fn fetch_notification(&self, notification_id: &str) -> Result<NotificationDetail> {
        let device = self.device().await.ok_or(FetchError::NotBootstrapped)?;
        let path = device.notification_path(notification_id);
        let body = self
            .client
            .get_json(&["api", "notifications", path.as_str()])
            .await?;
        let detail: NotificationDetail = serde_json::from_value(body)?;
        debug!(
            id = notification_id,
            notification_type = %detail.notification_type,
            status = %detail.status,
            "fetched notification"
        );
        Ok(detail)
    }
}

/// Device of the first entry in a `/api/notifications` body.
pub fn first_device(body: &Value) -> Result<NotificationDevice> {
    let first = body
        .get("notifications")
        .and_then(Value::as_array)
        .and_then(|list| list.first())
        .ok_or(FetchError::MissingField("notifications"))?;
    let field = |name: &'static str| {
        first
            .get(name)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or(FetchError::MissingField(name))
    };
    Ok(NotificationDevice {
        device_type: field("deviceType")?,
        device_serial_number: field("deviceSerialNumber")?,
    })
}

#[async_trait]
impl NotificationSource for NotificationFetcher {
    async fn fetch(
        &self,
        notification_id: &str,
    ) -> std::result::Result<NotificationDetail, CollaboratorError> {
        Ok(self.fetch_notification(notification_id).await?)
    }
}
