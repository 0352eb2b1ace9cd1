use std::time::Duration;

use tcomm_frame::{Identity, PROTOCOL_ALPHA};

use crate::error::Result;

/// Local endpoint every web client registers from.
pub const DEVICE_ENDPOINT_URN: &str = "urn:tcomm-endpoint:device:deviceType:0:deviceSerialNumber:0";
/// Remote web-messaging service the register command is addressed to.
pub const WEB_MESSAGING_ENDPOINT_URN: &str =
    "urn:tcomm-endpoint:service:serviceName:DeeWebsiteMessagingService";

/// Configuration for a push session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Time allowed between transport open and the session becoming ready.
    pub handshake_timeout: Duration,
    /// Transport protocol the gateway must agree to.
    pub expected_protocol: String,
    /// Origin URN of outbound gateway frames.
    pub local_endpoint: String,
    /// Destination URN of the register command.
    pub remote_endpoint: String,
    /// Capacity of the session event broadcast channel.
    pub event_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            handshake_timeout: Duration::from_secs(10),
            expected_protocol: PROTOCOL_ALPHA.to_string(),
            local_endpoint: DEVICE_ENDPOINT_URN.to_string(),
            remote_endpoint: WEB_MESSAGING_ENDPOINT_URN.to_string(),
            event_capacity: 64,
        }
    }
}

/// Endpoints parsed from a [`SessionConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Endpoints {
    pub local: Identity,
    pub remote: Identity,
}

impl SessionConfig {
    pub(crate) fn endpoints(&self) -> Result<Endpoints> {
        Ok(Endpoints {
            local: Identity::parse_urn(&self.local_endpoint)
                .map_err(tcomm_frame::FrameError::from)?,
            remote: Identity::parse_urn(&self.remote_endpoint)
                .map_err(tcomm_frame::FrameError::from)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SessionError;

    #[test]
    fn default_endpoints_parse() {
        let endpoints = SessionConfig::default().endpoints().unwrap();
        assert!(endpoints.local.is_device());
        assert!(!endpoints.remote.is_device());
        assert_eq!(endpoints.local.to_urn(), DEVICE_ENDPOINT_URN);
        assert_eq!(endpoints.remote.to_urn(), WEB_MESSAGING_ENDPOINT_URN);
    }

    #[test]
    fn bad_endpoint_is_rejected() {
        let config = SessionConfig {
            remote_endpoint: "urn:somewhere:else".to_string(),
            ..SessionConfig::default()
        };
        assert!(matches!(config.endpoints(), Err(SessionError::Frame(_))));
    }
}
