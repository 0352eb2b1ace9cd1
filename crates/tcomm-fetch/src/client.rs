use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::header::COOKIE;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::error::{FetchError, Result};

/// Host serving the activity and notification APIs.
pub const DEFAULT_AJAX_HOST: &str = "pitangui.amazon.com";

/// The APIs only answer browser-looking clients.
pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_10_3) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/43.0.2357.81 Safari/537.36";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings shared by the HTTP lookups.
#[derive(Clone, PartialEq, Eq)]
pub struct FetchConfig {
    pub ajax_host: String,
    /// Session cookie of a logged-in account. Required.
    pub cookie: String,
    pub timeout: Duration,
}

impl FetchConfig {
    pub fn new(cookie: impl Into<String>) -> Self {
        Self {
            ajax_host: DEFAULT_AJAX_HOST.to_string(),
            cookie: cookie.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn base_url(&self) -> Result<Url> {
        Ok(Url::parse(&format!("https://{}/", self.ajax_host))?)
    }
}

impl fmt::Debug for FetchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchConfig")
            .field("ajax_host", &self.ajax_host)
            .field(
                "cookie",
                &format_args!("<redacted:{} bytes>", self.cookie.len()),
            )
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Cookie-authenticated JSON client for the ajax host.
#[derive(Clone)]
pub struct AjaxClient {
    http: reqwest::Client,
    base: Url,
    cookie: String,
}

impl AjaxClient {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        if config.cookie.is_empty() {
            return Err(FetchError::MissingField("cookie"));
        }
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .gzip(true)
            .build()?;
        Ok(Self {
            http,
            base: config.base_url()?,
            cookie: config.cookie.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// GET `segments` under the ajax host and parse the body as JSON.
    pub async fn get_json(&self, segments: &[&str]) -> Result<Value> {
        let url = endpoint_url(&self.base, segments, epoch_millis())?;
        debug!(path = url.path(), "GET");

        let response = self
            .http
            .get(url.clone())
            .header(COOKIE, self.cookie.as_str())
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!(path = url.path(), status = status.as_u16(), "ajax request failed");
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

impl fmt::Debug for AjaxClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AjaxClient")
            .field("base", &self.base.as_str())
            .finish_non_exhaustive()
    }
}

/// `base` + percent-encoded `segments` + a `_=<timestamp>` cache buster.
pub(crate) fn endpoint_url(base: &Url, segments: &[&str], timestamp: u128) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| FetchError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
        .pop_if_empty()
        .extend(segments);
    url.query_pairs_mut()
        .append_pair("_", &timestamp.to_string());
    Ok(url)
}

fn epoch_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_url_encodes_segments() {
        let base = FetchConfig::new("c=1").base_url().unwrap();
        let url = endpoint_url(&base, &["api", "activities", "U1#E1"], 1234).unwrap();
        assert_eq!(
            url.as_str(),
            "https://pitangui.amazon.com/api/activities/U1%23E1?_=1234"
        );
    }

    #[test]
    fn custom_host() {
        let config = FetchConfig {
            ajax_host: "alexa.example.co.uk".to_string(),
            ..FetchConfig::new("c=1")
        };
        let url = endpoint_url(&config.base_url().unwrap(), &["api", "notifications"], 1).unwrap();
        assert_eq!(url.as_str(), "https://alexa.example.co.uk/api/notifications?_=1");
    }

    #[test]
    fn cookie_is_required() {
        assert!(matches!(
            AjaxClient::new(&FetchConfig::new("")),
            Err(FetchError::MissingField("cookie"))
        ));
    }

    #[test]
    fn debug_redacts_cookie() {
        let rendered = format!("{:?}", FetchConfig::new("session-id=secret"));
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("<redacted:17 bytes>"));
    }
}
