//! The protocol adapter trait and factory: the seam between the connection
//! pool and a concrete transport (SSH today; Telnet/REST are named in the
//! capability set but have no implementation module yet).

use crate::capabilities::DeviceType;
use crate::error::DeviceError;
use crate::ssh_adapter::SshAdapter;
use std::collections::HashMap;
use std::time::Duration;

/// Credentials handed to an adapter at connect time.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: Option<String>,
    pub secret: Option<String>,
}

/// The kind of configuration an adapter can retrieve with `get_config`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKind {
    Running,
    Startup,
    Candidate,
}

/// Static connection metadata an adapter reports about itself.
#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    pub protocol: String,
    pub host: String,
    pub port: u16,
    pub device_type: DeviceType,
    pub device_id: Option<String>,
}

/// Capability set every transport must implement. Adapters translate
/// library/vendor exceptions into [`DeviceError`] at the earliest boundary;
/// raw transport errors never escape these methods.
pub trait ProtocolAdapter: Send {
    fn connect(&mut self) -> Result<(), DeviceError>;
    fn disconnect(&mut self) -> Result<(), DeviceError>;
    fn is_connected(&self) -> bool;
    fn send_command(&mut self, command: &str, timeout: Option<Duration>) -> Result<String, DeviceError>;
    fn send_commands(
        &mut self,
        commands: &[String],
        timeout: Option<Duration>,
    ) -> Result<HashMap<String, String>, DeviceError> {
        let mut results = HashMap::with_capacity(commands.len());
        for cmd in commands {
            let output = self.send_command(cmd, timeout)?;
            results.insert(cmd.clone(), output);
        }
        Ok(results)
    }
    fn get_config(&mut self, kind: ConfigKind) -> Result<String, DeviceError>;
    /// TCP-level reachability probe. Never throws: failures collapse to `false`.
    fn check_connectivity(&self) -> bool;
    fn connection_info(&self) -> ConnectionInfo;
}

/// Parameters the factory needs to build an adapter, independent of which
/// protocol ends up selected.
#[derive(Debug, Clone)]
pub struct AdapterSpec {
    pub protocol: String,
    pub host: String,
    pub credentials: Credentials,
    pub device_type: DeviceType,
    pub port: Option<u16>,
    pub device_id: Option<String>,
}

pub struct ProtocolAdapterFactory;

impl ProtocolAdapterFactory {
    /// Choose the adapter implementation by protocol string (case-insensitive).
    /// An unrecognized protocol fails with `PROTOCOL_ERROR`; a recognized but
    /// unimplemented one (telnet, rest) fails with `PROTOCOL_UNSUPPORTED`.
    pub fn create(spec: AdapterSpec) -> Result<Box<dyn ProtocolAdapter>, DeviceError> {
        match spec.protocol.to_lowercase().as_str() {
            "ssh" => Ok(Box::new(SshAdapter::new(spec))),
            "telnet" | "rest" => Err(DeviceError::protocol_unsupported(&spec.protocol)),
            other => Err(DeviceError::protocol_invalid(other)),
        }
    }
}

/// Identity used by the connection pool to group reusable adapters. Two
/// borrows with the same key may reuse the same underlying session.
#[derive(Debug, Clone)]
pub struct ConnectionKey {
    pub protocol: String,
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub device_id: Option<String>,
}

impl ConnectionKey {
    pub fn default_port(protocol: &str) -> u16 {
        match protocol.to_lowercase().as_str() {
            "ssh" => 22,
            "telnet" => 23,
            "rest" => 443,
            _ => 0,
        }
    }

    pub fn new(
        protocol: &str,
        host: &str,
        port: Option<u16>,
        username: Option<&str>,
        device_id: Option<&str>,
    ) -> Self {
        Self {
            protocol: protocol.to_lowercase(),
            host: host.to_string(),
            port: port.unwrap_or_else(|| Self::default_port(protocol)),
            username: username.map(|s| s.to_string()),
            device_id: device_id.map(|s| s.to_string()),
        }
    }
}

impl PartialEq for ConnectionKey {
    fn eq(&self, other: &Self) -> bool {
        self.protocol == other.protocol
            && self.host == other.host
            && self.port == other.port
            && self.username == other.username
            && self.device_id == other.device_id
    }
}

impl Eq for ConnectionKey {}

impl std::hash::Hash for ConnectionKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.protocol.hash(state);
        self.host.hash(state);
        self.port.hash(state);
        self.username.hash(state);
        self.device_id.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_protocol_string_is_invalid_not_unsupported() {
        let spec = AdapterSpec {
            protocol: "carrier-pigeon".to_string(),
            host: "10.0.0.1".to_string(),
            credentials: Credentials { username: "a".into(), password: None, secret: None },
            device_type: DeviceType::Default,
            port: None,
            device_id: None,
        };
        let err = ProtocolAdapterFactory::create(spec).unwrap_err();
        assert_eq!(err.kind, crate::error::DeviceErrorKind::ProtocolError);
    }

    #[test]
    fn telnet_is_recognized_but_unsupported() {
        let spec = AdapterSpec {
            protocol: "Telnet".to_string(),
            host: "10.0.0.1".to_string(),
            credentials: Credentials { username: "a".into(), password: None, secret: None },
            device_type: DeviceType::Default,
            port: None,
            device_id: None,
        };
        let err = ProtocolAdapterFactory::create(spec).unwrap_err();
        assert_eq!(err.kind, crate::error::DeviceErrorKind::ProtocolUnsupported);
    }

    #[test]
    fn connection_key_default_ports_match_protocol() {
        assert_eq!(ConnectionKey::default_port("ssh"), 22);
        assert_eq!(ConnectionKey::default_port("telnet"), 23);
        assert_eq!(ConnectionKey::default_port("rest"), 443);
    }

    #[test]
    fn connection_keys_with_same_fields_are_equal() {
        let a = ConnectionKey::new("ssh", "10.0.0.1", None, Some("admin"), None);
        let b = ConnectionKey::new("SSH", "10.0.0.1", Some(22), Some("admin"), None);
        assert_eq!(a, b);
    }
}
