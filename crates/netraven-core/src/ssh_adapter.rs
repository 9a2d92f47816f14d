//! SSH implementation of [`crate::protocol::ProtocolAdapter`]. Owns the
//! `ssh2::Session`/`SSHChannel` lifecycle and translates every transport
//! failure into the [`DeviceError`] taxonomy at the method boundary.

use crate::capabilities::DeviceType;
use crate::channel::SSHChannel;
use crate::config::NetsshConfig;
use crate::error::{DeviceError, DeviceErrorKind, NetsshError};
use crate::patterns::PROMPT_PATTERN;
use crate::protocol::{AdapterSpec, ConfigKind, ConnectionInfo, ProtocolAdapter};
use regex::Regex;
use ssh2::Session;
use std::net::TcpStream;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

pub struct SshAdapter {
    spec: AdapterSpec,
    config: NetsshConfig,
    session: Option<Session>,
    channel: SSHChannel,
    base_prompt: Option<String>,
}

impl SshAdapter {
    pub fn new(spec: AdapterSpec) -> Self {
        Self {
            spec,
            config: NetsshConfig::default(),
            session: None,
            channel: SSHChannel::new(None),
            base_prompt: None,
        }
    }

    pub fn with_config(spec: AdapterSpec, config: NetsshConfig) -> Self {
        Self {
            spec,
            config,
            session: None,
            channel: SSHChannel::new(None),
            base_prompt: None,
        }
    }

    fn port(&self) -> u16 {
        self.spec.port.unwrap_or(self.config.default_port)
    }

    fn detect_base_prompt(&mut self) -> Result<(), NetsshError> {
        self.channel.write_channel("\n")?;
        let output = self
            .channel
            .read_until_prompt(Some(self.config.pattern_timeout), Some(&PROMPT_PATTERN))?;
        let prompt = output
            .lines()
            .last()
            .unwrap_or("")
            .trim_end_matches(['>', '#'])
            .trim()
            .to_string();
        if !prompt.is_empty() {
            self.channel.set_base_prompt(&prompt);
            self.base_prompt = Some(prompt);
        }
        Ok(())
    }
}

impl ProtocolAdapter for SshAdapter {
    #[instrument(skip(self), fields(host = %self.spec.host), level = "debug", name = "SshAdapter::connect")]
    fn connect(&mut self) -> Result<(), DeviceError> {
        let host = self.spec.host.clone();
        let port = self.port();
        let addr = format!("{}:{}", host, port);

        debug!(target: "SshAdapter::connect", "Establishing TCP connection to {}", addr);
        let tcp = TcpStream::connect_timeout(
            &addr.parse().map_err(|_| {
                DeviceError::new(DeviceErrorKind::HostUnreachable, format!("invalid address: {}", addr))
                    .with_host(&host)
            })?,
            self.config.connection_timeout,
        )
        .map_err(|e| DeviceError::from_transport(NetsshError::connection_failed(addr.clone(), e)).with_host(&host))?;

        tcp.set_read_timeout(Some(self.config.read_timeout)).ok();
        tcp.set_write_timeout(Some(self.config.write_timeout)).ok();

        let mut session = Session::new().map_err(|e| {
            DeviceError::from_transport(NetsshError::SshError(e)).with_host(&host)
        })?;
        session.set_tcp_stream(tcp);

        info!(target: "SshAdapter::connect", "Starting SSH handshake with {}", addr);
        session
            .handshake()
            .map_err(|e| DeviceError::from_transport(NetsshError::ssh_handshake_failed(e)).with_host(&host))?;

        let username = self.spec.credentials.username.clone();
        if let Some(password) = self.spec.credentials.password.clone() {
            session
                .userauth_password(&username, &password)
                .map_err(|e| {
                    DeviceError::from_transport(NetsshError::authentication_failed(username.clone(), e))
                        .with_host(&host)
                })?;
        } else {
            session.userauth_agent(&username).map_err(|e| {
                DeviceError::from_transport(NetsshError::authentication_failed(username.clone(), e))
                    .with_host(&host)
            })?;
        }

        let mut channel = session.channel_session().map_err(|e| {
            DeviceError::from_transport(NetsshError::SshError(e)).with_host(&host)
        })?;
        channel.request_pty("vt100", None, None).map_err(|e| {
            DeviceError::from_transport(NetsshError::SshError(e)).with_host(&host)
        })?;
        channel.shell().map_err(|e| {
            DeviceError::from_transport(NetsshError::SshError(e)).with_host(&host)
        })?;
        session.set_blocking(true);

        self.channel.set_remote_conn(channel);
        self.session = Some(session);

        if let Some(secret) = self.spec.credentials.secret.clone() {
            self.enter_enable(&secret).map_err(DeviceError::from_transport)?;
        }

        self.detect_base_prompt().map_err(DeviceError::from_transport)?;

        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), DeviceError> {
        if let Err(e) = self.channel.close() {
            warn!(target: "SshAdapter::disconnect", "error closing channel: {}", e);
        }
        self.session = None;
        self.base_prompt = None;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.session.is_some() && self.channel.is_some()
    }

    fn send_command(&mut self, command: &str, timeout: Option<Duration>) -> Result<String, DeviceError> {
        if !self.is_connected() {
            return Err(DeviceError::new(
                DeviceErrorKind::ConnectionError,
                "adapter is not connected",
            )
            .with_host(&self.spec.host)
            .with_commands(vec![command.to_string()]));
        }

        self.channel
            .write_channel(command)
            .and_then(|_| self.channel.write_channel("\n"))
            .map_err(|e| DeviceError::from_transport(e).with_commands(vec![command.to_string()]))?;

        let prompt_regex = self
            .base_prompt
            .as_ref()
            .and_then(|p| Regex::new(&format!(r"{}[>#]", regex::escape(p))).ok());

        let result = self
            .channel
            .read_until_prompt(timeout.or(Some(self.config.read_timeout)), prompt_regex.as_ref());

        match result {
            Ok(output) => Ok(output),
            Err(NetsshError::TimeoutError(msg)) => Err(DeviceError::new(
                DeviceErrorKind::CommandTimeout,
                msg,
            )
            .with_host(&self.spec.host)
            .with_commands(vec![command.to_string()])),
            Err(e) => Err(DeviceError::from_transport(e)
                .with_commands(vec![command.to_string()])
                .with_host(&self.spec.host)),
        }
    }

    fn get_config(&mut self, kind: ConfigKind) -> Result<String, DeviceError> {
        let device_type = self.spec.device_type;
        let key = match kind {
            ConfigKind::Running => crate::capabilities::KEY_SHOW_RUNNING,
            // No catalogue keys yet for startup/candidate; running is the
            // only form the command tables expose.
            ConfigKind::Startup => crate::capabilities::KEY_SHOW_RUNNING,
            ConfigKind::Candidate => crate::capabilities::KEY_SHOW_RUNNING,
        };
        let command = crate::capabilities::command(device_type, key).ok_or_else(|| {
            DeviceError::new(DeviceErrorKind::ConfigError, "no config command for device type")
        })?;
        let timeout = Duration::from_secs(crate::capabilities::timeout_for(device_type, key));
        self.send_command(command, Some(timeout))
    }

    fn check_connectivity(&self) -> bool {
        let addr = format!("{}:{}", self.spec.host, self.port());
        match addr.parse() {
            Ok(socket_addr) => {
                TcpStream::connect_timeout(&socket_addr, Duration::from_secs(5)).is_ok()
            }
            Err(_) => false,
        }
    }

    fn connection_info(&self) -> ConnectionInfo {
        ConnectionInfo {
            protocol: "ssh".to_string(),
            host: self.spec.host.clone(),
            port: self.port(),
            device_type: self.spec.device_type,
            device_id: self.spec.device_id.clone(),
        }
    }
}

impl SshAdapter {
    fn enter_enable(&mut self, secret: &str) -> Result<(), NetsshError> {
        let enable_cmd = crate::capabilities::command(self.spec.device_type, crate::capabilities::KEY_ENTER_ENABLE)
            .unwrap_or("enable");
        if enable_cmd.is_empty() {
            return Ok(());
        }
        self.channel.write_channel(enable_cmd)?;
        self.channel.write_channel("\n")?;
        let output = self.channel.read_until_prompt(
            Some(self.config.pattern_timeout),
            Some(&Regex::new(r"(?i)password:|[>#]$").unwrap()),
        )?;
        if output.to_lowercase().contains("password") {
            self.channel.write_channel(secret)?;
            self.channel.write_channel("\n")?;
            self.channel
                .read_until_prompt(Some(self.config.pattern_timeout), Some(&PROMPT_PATTERN))?;
        }
        Ok(())
    }
}
