use std::io;
use thiserror::Error;

/// Low-level transport errors raised by the SSH channel and session plumbing.
///
/// These never escape a [`crate::protocol::ProtocolAdapter`] method: adapters
/// translate them into a [`DeviceError`] at the boundary, the one place raw
/// transport exceptions are allowed to exist (see [`DeviceError::from_transport`]).
#[derive(Error, Debug)]
pub enum NetsshError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("SSH error: {0}")]
    SshError(#[from] ssh2::Error),

    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Command error: {0}")]
    CommandError(String),

    #[error("Read error: {0}")]
    ReadError(String),

    #[error("Timeout error: {0}")]
    TimeoutError(String),

    #[error("Write error: {0}")]
    WriteError(String),

    #[error("Pattern match error: {0}")]
    PatternError(String),

    #[error("Channel error: {0}")]
    ChannelError(String),

    #[error("Disconnect error: {0}")]
    DisconnectError(String),

    #[error("Connection error: failed to connect to {addr}: {source}")]
    ConnectionFailed {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("SSH handshake failed: {source}")]
    SshHandshakeFailed {
        #[source]
        source: ssh2::Error,
    },

    #[error("Authentication failed for user {username}: {source}")]
    AuthenticationFailed {
        username: String,
        #[source]
        source: ssh2::Error,
    },

    #[error("Regex error: {0}")]
    RegexError(#[from] regex::Error),
}

impl NetsshError {
    pub fn connection_failed(addr: impl Into<String>, err: io::Error) -> Self {
        Self::ConnectionFailed {
            addr: addr.into(),
            source: err,
        }
    }

    pub fn ssh_handshake_failed(err: ssh2::Error) -> Self {
        Self::SshHandshakeFailed { source: err }
    }

    pub fn authentication_failed(username: impl Into<String>, err: ssh2::Error) -> Self {
        Self::AuthenticationFailed {
            username: username.into(),
            source: err,
        }
    }
}

/// The error taxonomy from the error handling design: every failure that
/// crosses a protocol adapter, connection pool, or device communication
/// service boundary is tagged with one of these kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceErrorKind {
    ConnectionError,
    AuthenticationError,
    TimeoutError,
    SshKeyError,
    CommandError,
    CommandTimeout,
    CommandSyntaxError,
    ConfigError,
    ConfigSyntaxError,
    ConfigLockError,
    ProtocolError,
    ProtocolUnsupported,
    DeviceTypeError,
    DeviceTypeUnsupported,
    NetworkError,
    HostUnreachable,
    PortUnreachable,
    ParameterError,
    ParameterInvalid,
    ParameterMissing,
    PoolExhausted,
    UnknownError,
}

impl DeviceErrorKind {
    /// Whether a caller may usefully retry an operation that failed with this kind.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            DeviceErrorKind::ConnectionError
                | DeviceErrorKind::TimeoutError
                | DeviceErrorKind::CommandTimeout
                | DeviceErrorKind::NetworkError
                | DeviceErrorKind::HostUnreachable
                | DeviceErrorKind::PortUnreachable
                | DeviceErrorKind::PoolExhausted
        )
    }
}

impl std::fmt::Display for DeviceErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A structured, serializable device-layer error. Every field beyond `kind`
/// and `message` is optional: the amount of context available differs by
/// call site (a pool-exhaustion error has no `commands`; a command error
/// usually does).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DeviceError {
    pub kind: DeviceErrorKind,
    pub message: String,
    pub device_id: Option<String>,
    pub host: Option<String>,
    pub session_id: Option<String>,
    #[serde(default)]
    pub commands: Vec<String>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    #[serde(default)]
    pub details: serde_json::Map<String, serde_json::Value>,
    /// String rendering of the underlying cause, if any. Kept as a string
    /// rather than a boxed error so the whole struct stays `Serialize`.
    pub cause: Option<String>,
}

impl DeviceError {
    pub fn new(kind: DeviceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            device_id: None,
            host: None,
            session_id: None,
            commands: Vec::new(),
            timestamp: chrono::Utc::now(),
            details: serde_json::Map::new(),
            cause: None,
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_commands(mut self, commands: Vec<String>) -> Self {
        self.commands = commands;
        self
    }

    pub fn with_detail(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    pub fn with_cause(mut self, cause: impl std::fmt::Display) -> Self {
        self.cause = Some(cause.to_string());
        self
    }

    pub fn parameter_missing(field: &str) -> Self {
        Self::new(
            DeviceErrorKind::ParameterMissing,
            format!("missing required parameter: {}", field),
        )
        .with_detail("field", field)
    }

    pub fn parameter_invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::new(DeviceErrorKind::ParameterInvalid, reason.into()).with_detail("field", field)
    }

    pub fn pool_exhausted(message: impl Into<String>) -> Self {
        Self::new(DeviceErrorKind::PoolExhausted, message.into())
    }

    pub fn protocol_unsupported(protocol: &str) -> Self {
        Self::new(
            DeviceErrorKind::ProtocolUnsupported,
            format!("protocol '{}' has no adapter implementation", protocol),
        )
    }

    pub fn protocol_invalid(protocol: &str) -> Self {
        Self::new(
            DeviceErrorKind::ProtocolError,
            format!("unknown protocol '{}'", protocol),
        )
    }

    pub fn device_type_unsupported(device_type: &str) -> Self {
        Self::new(
            DeviceErrorKind::DeviceTypeUnsupported,
            format!("no capability profile for device type '{}'", device_type),
        )
    }

    /// Serialize to a plain JSON object, for logging and audit trails.
    pub fn to_dict(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Translate a transport-level error into the device error taxonomy.
    pub fn from_transport(err: NetsshError) -> Self {
        let kind = match &err {
            NetsshError::ConnectionFailed { .. } | NetsshError::ConnectionError(_) => {
                DeviceErrorKind::ConnectionError
            }
            NetsshError::SshHandshakeFailed { .. } => DeviceErrorKind::ConnectionError,
            NetsshError::AuthenticationFailed { .. } | NetsshError::AuthenticationError(_) => {
                DeviceErrorKind::AuthenticationError
            }
            NetsshError::TimeoutError(_) => DeviceErrorKind::TimeoutError,
            NetsshError::CommandError(_) => DeviceErrorKind::CommandError,
            NetsshError::ReadError(_) | NetsshError::WriteError(_) | NetsshError::ChannelError(_) => {
                DeviceErrorKind::CommandError
            }
            NetsshError::PatternError(_) | NetsshError::RegexError(_) => {
                DeviceErrorKind::UnknownError
            }
            NetsshError::DisconnectError(_) => DeviceErrorKind::UnknownError,
            NetsshError::IoError(_) | NetsshError::SshError(_) => DeviceErrorKind::NetworkError,
        };
        let message = err.to_string();
        Self::new(kind, message).with_cause(err)
    }
}

impl std::fmt::Display for DeviceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for DeviceError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_connection_failure_maps_to_connection_error() {
        let io_err = io::Error::new(io::ErrorKind::ConnectionRefused, "refused");
        let transport = NetsshError::connection_failed("10.0.0.1:22", io_err);
        let device_err = DeviceError::from_transport(transport);
        assert_eq!(device_err.kind, DeviceErrorKind::ConnectionError);
        assert!(device_err.cause.is_some());
    }

    #[test]
    fn to_dict_round_trips_core_fields() {
        let err = DeviceError::new(DeviceErrorKind::CommandError, "boom")
            .with_host("10.0.0.1")
            .with_device_id("r1")
            .with_commands(vec!["show version".to_string()]);
        let dict = err.to_dict();
        assert_eq!(dict["host"], "10.0.0.1");
        assert_eq!(dict["device_id"], "r1");
        assert_eq!(dict["commands"][0], "show version");
    }

    #[test]
    fn retryable_kinds_match_taxonomy_policy() {
        assert!(DeviceErrorKind::PoolExhausted.is_retryable());
        assert!(DeviceErrorKind::TimeoutError.is_retryable());
        assert!(!DeviceErrorKind::AuthenticationError.is_retryable());
        assert!(!DeviceErrorKind::ParameterMissing.is_retryable());
    }
}
