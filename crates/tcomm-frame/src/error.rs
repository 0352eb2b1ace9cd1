/// Errors that can occur while parsing or validating an endpoint identity.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    /// The URN matched neither the device nor the service grammar.
    #[error("unrecognized identity urn: {0}")]
    Unrecognized(String),

    /// A device identity is missing its type or serial number.
    #[error("device identity requires a non-empty device type and serial number")]
    MissingDeviceField,

    /// A service identity is missing its name.
    #[error("service identity requires a non-empty service name")]
    MissingServiceName,

    /// A service identity has exactly one of hostname/port.
    #[error("service identity requires either a hostname and a port, or neither")]
    HostPortMismatch,
}

/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A fixed-width field or delimiter could not be decoded.
    #[error("malformed field: {0}")]
    Format(String),

    /// The checksum carried by the frame does not match its contents.
    #[error("checksum mismatch (frame 0x{expected:08x}, computed 0x{actual:08x})")]
    Checksum { expected: u32, actual: u32 },

    /// A footer, marker, length or message type did not match the protocol.
    #[error("framing error: {0}")]
    Framing(String),

    /// An origin or destination URN could not be parsed.
    #[error("identity error: {0}")]
    Identity(#[from] IdentityError),

    /// JSON serialization error while building a payload.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FrameError {
    pub(crate) fn format(message: impl Into<String>) -> Self {
        Self::Format(message.into())
    }

    pub(crate) fn framing(message: impl Into<String>) -> Self {
        Self::Framing(message.into())
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
