use async_trait::async_trait;
use serde_json::Value;
use tcomm_session::{Activity, ActivityKey, ActivitySource, CollaboratorError};
use tracing::debug;

use crate::client::{AjaxClient, FetchConfig};
use crate::error::{FetchError, Result};

/// Resolves `PUSH_ACTIVITY` keys through `/api/activities`.
#[derive(Debug, Clone)]
pub struct ActivityFetcher {
    client: AjaxClient,
}

impl ActivityFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        Ok(Self {
            client: AjaxClient::new(config)?,
        })
    }

    pub async fn fetch_activity(&self, key: &ActivityKey) -> Result<Activity> {
        let id = activity_id(key);
        let body = self
            .client
            .get_json(&["api", "activities", id.as_str()])
            .await?;
        let activity = parse_activity(body)?;
        debug!(id = %key.id, summary = ?activity.summary, "fetched activity");
        Ok(activity)
    }
}

/// Full activity id: `<user>#<entry>`.
pub fn activity_id(key: &ActivityKey) -> String {
    format!("{}#{}", key.user, key.id)
}

/// Pull `activity` out of a response body and expand its string-encoded
/// `description` in place.
pub fn parse_activity(body: Value) -> Result<Activity> {
    let Value::Object(mut body) = body else {
        return Err(FetchError::MissingField("activity"));
    };
    let mut activity = body
        .remove("activity")
        .ok_or(FetchError::MissingField("activity"))?;

    let description = match activity.get("description") {
        Some(Value::String(text)) => serde_json::from_str::<Value>(text)?,
        Some(other) => other.clone(),
        None => return Err(FetchError::MissingField("description")),
    };
    let summary = description
        .get("summary")
        .and_then(Value::as_str)
        .map(str::to_string);
    if let Some(fields) = activity.as_object_mut() {
        fields.insert("description".to_string(), description);
    }

    Ok(Activity { summary, activity })
}

#[async_trait]
impl ActivitySource for ActivityFetcher {
    async fn fetch(&self, key: ActivityKey) -> std::result::Result<Activity, CollaboratorError> {
        Ok(self.fetch_activity(&key).await?)
    }
}
