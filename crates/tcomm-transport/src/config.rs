use std::fmt;

use url::Url;

use crate::error::Result;

/// Default push gateway host.
pub const DEFAULT_PUSH_HOST: &str = "dp-gw-na-js.amazon.com";
/// Default `Origin` header sent with the WebSocket upgrade.
pub const DEFAULT_ORIGIN: &str = "http://echo.amazon.com";
/// Device type the push gateway expects from web clients.
pub const DEFAULT_DEVICE_TYPE: &str = "ALEGCNGL9K0HM";

/// Configuration for a push gateway connection.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectConfig {
    /// Host name of the push gateway (no scheme).
    pub push_host: String,
    /// Device type placed in the query string.
    pub device_type: String,
    /// Device serial placed in the query string.
    pub serial: String,
    /// Session cookie. Treated as opaque credential material and redacted in
    /// debug output.
    pub cookie: String,
    /// Value of the `Origin` header.
    pub origin: String,
}

impl Default for ConnectConfig {
    fn default() -> Self {
        Self {
            push_host: DEFAULT_PUSH_HOST.to_string(),
            device_type: DEFAULT_DEVICE_TYPE.to_string(),
            serial: String::new(),
            cookie: String::new(),
            origin: DEFAULT_ORIGIN.to_string(),
        }
    }
}

impl ConnectConfig {
    pub fn new(serial: impl Into<String>, cookie: impl Into<String>) -> Self {
        Self {
            serial: serial.into(),
            cookie: cookie.into(),
            ..Self::default()
        }
    }

    /// `wss://<push_host>/?x-amz-device-type=<type>&x-amz-device-serial=<serial>`
    pub fn url(&self) -> Result<Url> {
        let mut url = Url::parse(&format!("wss://{}/", self.push_host))?;
        url.query_pairs_mut()
            .append_pair("x-amz-device-type", &self.device_type)
            .append_pair("x-amz-device-serial", &self.serial);
        Ok(url)
    }
}

impl fmt::Debug for ConnectConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectConfig")
            .field("push_host", &self.push_host)
            .field("device_type", &self.device_type)
            .field("serial", &self.serial)
            .field(
                "cookie",
                &format_args!("<redacted:{} bytes>", self.cookie.len()),
            )
            .field("origin", &self.origin)
            .finish()
    }
}
