//! Endpoint identities and their URN form.
//!
//! ```text
//! urn:tcomm-endpoint:device[:deviceAccountId:V][:customerId:V][:deviceType:V][:deviceSerialNumber:V]
//! urn:tcomm-endpoint:service[:serviceName:V][:domain:V][:realm:V][:hostname:V][:port:V]
//! ```
//!
//! Segments are optional but must appear in this order. An absent segment is
//! `None`, which is distinct from a segment carrying an empty value.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::error::IdentityError;

const URN_PREFIX: &str = "urn:tcomm-endpoint";

static DEVICE_URN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^urn:tcomm-endpoint:device(:deviceAccountId:([^:]*))?(:customerId:([^:]*))?(:deviceType:([^:]*))?(:deviceSerialNumber:([^:]*))?$",
    )
    .expect("device urn pattern is valid")
});

static SERVICE_URN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^urn:tcomm-endpoint:service(:serviceName:([^:]*))?(:domain:([^:]*))?(:realm:([^:]*))?(:hostname:([^:]*))?(:port:([^:]*))?$",
    )
    .expect("service urn pattern is valid")
});

/// Addressable endpoint: a device or a cloud service.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identity {
    Device(DeviceIdentity),
    Service(ServiceIdentity),
}

/// A device endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceIdentity {
    device_account_id: Option<String>,
    customer_id: Option<String>,
    device_type: String,
    device_serial_number: String,
}

/// A service endpoint. Hostname and port are either both set or both absent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceIdentity {
    service_name: String,
    domain: Option<String>,
    realm: Option<String>,
    endpoint: Option<(String, String)>,
}

impl DeviceIdentity {
    pub fn new(
        device_type: impl Into<String>,
        device_serial_number: impl Into<String>,
    ) -> Result<Self, IdentityError> {
        let device_type = device_type.into();
        let device_serial_number = device_serial_number.into();
        if device_type.is_empty() || device_serial_number.is_empty() {
            return Err(IdentityError::MissingDeviceField);
        }
        Ok(Self {
            device_account_id: None,
            customer_id: None,
            device_type,
            device_serial_number,
        })
    }

    pub fn with_device_account_id(mut self, id: impl Into<String>) -> Self {
        self.device_account_id = Some(id.into());
        self
    }

    pub fn with_customer_id(mut self, id: impl Into<String>) -> Self {
        self.customer_id = Some(id.into());
        self
    }

    pub fn device_account_id(&self) -> Option<&str> {
        self.device_account_id.as_deref()
    }

    pub fn customer_id(&self) -> Option<&str> {
        self.customer_id.as_deref()
    }

    pub fn device_type(&self) -> &str {
        &self.device_type
    }

    pub fn device_serial_number(&self) -> &str {
        &self.device_serial_number
    }

    fn from_captures(caps: &Captures<'_>) -> Result<Self, IdentityError> {
        let mut identity = Self::new(
            group(caps, 6).unwrap_or_default(),
            group(caps, 8).unwrap_or_default(),
        )?;
        identity.device_account_id = group(caps, 2);
        identity.customer_id = group(caps, 4);
        Ok(identity)
    }

    pub fn to_urn(&self) -> String {
        let mut urn = format!("{URN_PREFIX}:device");
        push_segment(&mut urn, "deviceAccountId", self.device_account_id.as_deref());
        push_segment(&mut urn, "customerId", self.customer_id.as_deref());
        push_segment(&mut urn, "deviceType", Some(&self.device_type));
        push_segment(
            &mut urn,
            "deviceSerialNumber",
            Some(&self.device_serial_number),
        );
        urn
    }
}

impl ServiceIdentity {
    pub fn new(service_name: impl Into<String>) -> Result<Self, IdentityError> {
        let service_name = service_name.into();
        if service_name.is_empty() {
            return Err(IdentityError::MissingServiceName);
        }
        Ok(Self {
            service_name,
            domain: None,
            realm: None,
            endpoint: None,
        })
    }

    /// Build a service identity from its optional parts, enforcing the
    /// hostname/port pairing.
    pub fn from_parts(
        service_name: impl Into<String>,
        domain: Option<String>,
        realm: Option<String>,
        hostname: Option<String>,
        port: Option<String>,
    ) -> Result<Self, IdentityError> {
        let mut identity = Self::new(service_name)?;
        identity.domain = domain;
        identity.realm = realm;
        identity.endpoint = match (hostname, port) {
            (Some(hostname), Some(port)) => Some((hostname, port)),
            (None, None) => None,
            _ => return Err(IdentityError::HostPortMismatch),
        };
        Ok(identity)
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_realm(mut self, realm: impl Into<String>) -> Self {
        self.realm = Some(realm.into());
        self
    }

    pub fn with_endpoint(mut self, hostname: impl Into<String>, port: impl Into<String>) -> Self {
        self.endpoint = Some((hostname.into(), port.into()));
        self
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    pub fn realm(&self) -> Option<&str> {
        self.realm.as_deref()
    }

    pub fn hostname(&self) -> Option<&str> {
        self.endpoint.as_ref().map(|(hostname, _)| hostname.as_str())
    }

    pub fn port(&self) -> Option<&str> {
        self.endpoint.as_ref().map(|(_, port)| port.as_str())
    }

    fn from_captures(caps: &Captures<'_>) -> Result<Self, IdentityError> {
        Self::from_parts(
            group(caps, 2).unwrap_or_default(),
            group(caps, 4),
            group(caps, 6),
            group(caps, 8),
            group(caps, 10),
        )
    }

    pub fn to_urn(&self) -> String {
        let mut urn = format!("{URN_PREFIX}:service");
        push_segment(&mut urn, "serviceName", Some(&self.service_name));
        push_segment(&mut urn, "domain", self.domain.as_deref());
        push_segment(&mut urn, "realm", self.realm.as_deref());
        push_segment(&mut urn, "hostname", self.hostname());
        push_segment(&mut urn, "port", self.port());
        urn
    }
}

impl Identity {
    /// Parse a URN, trying the device grammar before the service grammar.
    pub fn parse_urn(urn: &str) -> Result<Self, IdentityError> {
        if let Some(caps) = DEVICE_URN.captures(urn) {
            return DeviceIdentity::from_captures(&caps).map(Identity::Device);
        }
        if let Some(caps) = SERVICE_URN.captures(urn) {
            return ServiceIdentity::from_captures(&caps).map(Identity::Service);
        }
        Err(IdentityError::Unrecognized(urn.to_string()))
    }

    pub fn to_urn(&self) -> String {
        match self {
            Identity::Device(device) => device.to_urn(),
            Identity::Service(service) => service.to_urn(),
        }
    }

    pub fn is_device(&self) -> bool {
        matches!(self, Identity::Device(_))
    }
}

impl From<DeviceIdentity> for Identity {
    fn from(value: DeviceIdentity) -> Self {
        Identity::Device(value)
    }
}

impl From<ServiceIdentity> for Identity {
    fn from(value: ServiceIdentity) -> Self {
        Identity::Service(value)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_urn())
    }
}

impl FromStr for Identity {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Identity::parse_urn(s)
    }
}

fn group(caps: &Captures<'_>, index: usize) -> Option<String> {
    caps.get(index).map(|m| m.as_str().to_string())
}

fn push_segment(urn: &mut String, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        urn.push(':');
        urn.push_str(key);
        urn.push(':');
        urn.push_str(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_with_only_required_fields_round_trips() {
        let urn = "urn:tcomm-endpoint:device:deviceType:0:deviceSerialNumber:0";
        let identity = Identity::parse_urn(urn).unwrap();
        let Identity::Device(device) = &identity else {
            panic!("expected a device identity");
        };
        assert_eq!(device.device_type(), "0");
        assert_eq!(device.device_serial_number(), "0");
        assert!(device.device_account_id().is_none());
        assert!(device.customer_id().is_none());
        assert_eq!(identity.to_urn(), urn);
    }

    #[test]
    fn device_with_all_fields_round_trips() {
        let device = DeviceIdentity::new("ALEGCNGL9K0HM", "G090XX1234")
            .unwrap()
            .with_device_account_id("A1")
            .with_customer_id("C1");
        let identity = Identity::from(device);
        let urn = identity.to_urn();
        assert_eq!(
            urn,
            "urn:tcomm-endpoint:device:deviceAccountId:A1:customerId:C1:deviceType:ALEGCNGL9K0HM:deviceSerialNumber:G090XX1234"
        );
        assert_eq!(Identity::parse_urn(&urn).unwrap(), identity);
    }

    #[test]
    fn service_with_only_name_round_trips() {
        let urn = "urn:tcomm-endpoint:service:serviceName:DeeWebsiteMessagingService";
        let identity: Identity = urn.parse().unwrap();
        let Identity::Service(service) = &identity else {
            panic!("expected a service identity");
        };
        assert_eq!(service.service_name(), "DeeWebsiteMessagingService");
        assert!(service.hostname().is_none());
        assert_eq!(identity.to_string(), urn);
    }

    #[test]
    fn service_with_all_fields_round_trips() {
        let identity = Identity::from(
            ServiceIdentity::new("svc")
                .unwrap()
                .with_domain("example")
                .with_realm("USAmazon")
                .with_endpoint("host.example", "443"),
        );
        let urn = identity.to_urn();
        assert_eq!(
            urn,
            "urn:tcomm-endpoint:service:serviceName:svc:domain:example:realm:USAmazon:hostname:host.example:port:443"
        );
        assert_eq!(Identity::parse_urn(&urn).unwrap(), identity);
    }

    #[test]
    fn empty_segment_is_distinct_from_absent() {
        let urn = "urn:tcomm-endpoint:service:serviceName:svc:domain:";
        let Identity::Service(service) = Identity::parse_urn(urn).unwrap() else {
            panic!("expected a service identity");
        };
        assert_eq!(service.domain(), Some(""));
        assert_eq!(service.realm(), None);
        assert_eq!(service.to_urn(), urn);
    }

    #[test]
    fn hostname_without_port_is_rejected() {
        let result = ServiceIdentity::from_parts(
            "svc",
            None,
            None,
            Some("host.example".to_string()),
            None,
        );
        assert_eq!(result.unwrap_err(), IdentityError::HostPortMismatch);

        let parsed = Identity::parse_urn("urn:tcomm-endpoint:service:serviceName:svc:hostname:h");
        assert_eq!(parsed.unwrap_err(), IdentityError::HostPortMismatch);
    }

    #[test]
    fn device_requires_type_and_serial() {
        assert_eq!(
            DeviceIdentity::new("", "serial").unwrap_err(),
            IdentityError::MissingDeviceField
        );
        assert_eq!(
            Identity::parse_urn("urn:tcomm-endpoint:device:deviceType:X").unwrap_err(),
            IdentityError::MissingDeviceField
        );
    }

    #[test]
    fn out_of_order_segments_are_unrecognized() {
        let result =
            Identity::parse_urn("urn:tcomm-endpoint:device:deviceSerialNumber:1:deviceType:2");
        assert!(matches!(result, Err(IdentityError::Unrecognized(_))));
    }

    #[test]
    fn unknown_kind_is_unrecognized() {
        let result = Identity::parse_urn("urn:tcomm-endpoint:robot:name:x");
        assert!(matches!(result, Err(IdentityError::Unrecognized(_))));
    }
}
