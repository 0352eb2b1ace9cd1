use std::fmt;
use std::io;

use tcomm_fetch::FetchError;
use tcomm_frame::FrameError;
use tcomm_session::SessionError;
use tcomm_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::InvalidInput => USAGE,
        io::ErrorKind::TimedOut => TIMEOUT,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: &TransportError) -> CliError {
    let code = match err {
        TransportError::Url(_) | TransportError::Header { .. } => USAGE,
        TransportError::Closed => FAILURE,
        _ => TRANSPORT_ERROR,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn frame_error(context: &str, err: &FrameError) -> CliError {
    CliError::new(DATA_INVALID, format!("{context}: {err}"))
}

pub fn session_error(context: &str, err: &SessionError) -> CliError {
    match err {
        SessionError::Transport(inner) => transport_error(context, inner),
        SessionError::Frame(inner) => frame_error(context, inner),
        SessionError::HandshakeTimeout(_) => CliError::new(TIMEOUT, format!("{context}: {err}")),
        SessionError::NegotiationMismatch { .. } | SessionError::Json(_) => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        SessionError::Aborted(_) => CliError::new(FAILURE, format!("{context}: {err}")),
        SessionError::InvalidState(_) => CliError::new(INTERNAL, format!("{context}: {err}")),
    }
}

pub fn fetch_error(context: &str, err: &FetchError) -> CliError {
    let code = match err {
        FetchError::Url(_) | FetchError::MissingField("cookie") => USAGE,
        FetchError::Http(inner) if inner.is_timeout() => TIMEOUT,
        FetchError::Http(_) | FetchError::Status { .. } => TRANSPORT_ERROR,
        FetchError::Json(_) | FetchError::MissingField(_) => DATA_INVALID,
        FetchError::NotBootstrapped => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn session_errors_map_to_exit_codes() {
        let timeout = SessionError::HandshakeTimeout(Duration::from_secs(10));
        assert_eq!(session_error("listen", &timeout).code, TIMEOUT);

        let mismatch = SessionError::NegotiationMismatch {
            expected: "A:H".to_string(),
            actual: "B:X".to_string(),
        };
        assert_eq!(session_error("listen", &mismatch).code, DATA_INVALID);

        let socket = SessionError::Transport(TransportError::Socket("reset".to_string()));
        let mapped = session_error("listen", &socket);
        assert_eq!(mapped.code, TRANSPORT_ERROR);
        assert!(mapped.message.starts_with("listen: "));
    }

    #[test]
    fn missing_cookie_is_a_usage_error() {
        assert_eq!(
            fetch_error("fetch", &FetchError::MissingField("cookie")).code,
            USAGE
        );
        assert_eq!(
            fetch_error("fetch", &FetchError::MissingField("activity")).code,
            DATA_INVALID
        );
    }
}
