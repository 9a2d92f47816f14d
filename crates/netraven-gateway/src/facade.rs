//! The Gateway Facade: the contract a future HTTP layer would sit behind.
//! Every method borrows a connection through the device communication
//! service, records the corresponding metrics, and brackets the call with
//! a session-scoped log pair, collapsing its outcome to
//! [`GatewayResponse`].

use crate::error::{GatewayError, GatewayResponse, Result};
use crate::metrics::GatewayMetrics;
use crate::session::OperationSession;
use netraven_core::protocol::ConfigKind;
use netraven_core::service::{DeviceCommunicationService, SessionRequest};
use netraven_core::{capabilities, DeviceError, DeviceErrorKind};
use serde::Serialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct ConnectResult {
    pub reachable: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommandResult {
    pub output: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BackupResult {
    pub running_config: String,
    pub model: Option<String>,
    pub version: Option<String>,
}

pub struct GatewayFacade {
    service: DeviceCommunicationService,
    metrics: GatewayMetrics,
}

impl GatewayFacade {
    pub fn new(service: DeviceCommunicationService) -> Self {
        Self { service, metrics: GatewayMetrics::new() }
    }

    fn session_id(request: &SessionRequest) -> String {
        request.session_id.clone().unwrap_or_else(|| Uuid::new_v4().to_string())
    }

    pub fn connect(&self, request: &SessionRequest) -> GatewayResponse<ConnectResult> {
        let session_id = Self::session_id(request);
        let session = OperationSession::start("connect", request.host.clone(), session_id);
        let started = Instant::now();

        let result = self.service.check_connectivity(request);
        self.metrics.record_device_connection(&request.host, result.is_ok(), started.elapsed());
        self.metrics.record_request("connect", started.elapsed());

        match result {
            Ok(reachable) => {
                if !reachable {
                    self.metrics.record_device_disconnect(&request.host);
                }
                session.end(true, None);
                GatewayResponse::ok(ConnectResult { reachable })
            }
            Err(e) => {
                self.metrics.record_error("connect");
                session.end(false, Some(&e.message));
                GatewayResponse::from_result(Err(GatewayError::from(e)))
            }
        }
    }

    pub fn execute_command(
        &self,
        request: &SessionRequest,
        command: &str,
        timeout: Option<Duration>,
    ) -> GatewayResponse<CommandResult> {
        let session_id = Self::session_id(request);
        let session = OperationSession::start("execute_command", request.host.clone(), session_id);
        let started = Instant::now();

        let result = self.service.execute_command(request, command, timeout);
        self.metrics.record_device_command(&request.host, result.is_ok(), started.elapsed());
        self.metrics.record_request("execute_command", started.elapsed());

        match result {
            Ok(output) => {
                session.end(true, None);
                GatewayResponse::ok(CommandResult { output })
            }
            Err(e) => {
                self.metrics.record_error("execute_command");
                session.end(false, Some(&e.message));
                GatewayResponse::from_result(Err(GatewayError::from(e)))
            }
        }
    }

    pub fn execute_commands(
        &self,
        request: &SessionRequest,
        commands: &[String],
        timeout: Option<Duration>,
    ) -> GatewayResponse<HashMap<String, String>> {
        let session_id = Self::session_id(request);
        let session = OperationSession::start("execute_commands", request.host.clone(), session_id);
        let started = Instant::now();

        let result = self.service.execute_commands(request, commands, timeout);
        self.metrics.record_device_command(&request.host, result.is_ok(), started.elapsed());
        self.metrics.record_request("execute_commands", started.elapsed());

        match result {
            Ok(outputs) => {
                session.end(true, None);
                GatewayResponse::ok(outputs)
            }
            Err(e) => {
                self.metrics.record_error("execute_commands");
                session.end(false, Some(&e.message));
                GatewayResponse::from_result(Err(GatewayError::from(e)))
            }
        }
    }

    pub fn get_config(&self, request: &SessionRequest, kind: ConfigKind) -> GatewayResponse<CommandResult> {
        let session_id = Self::session_id(request);
        let session = OperationSession::start("get_config", request.host.clone(), session_id);
        let started = Instant::now();

        let result = self.service.get_config(request, kind);
        self.metrics.record_device_command(&request.host, result.is_ok(), started.elapsed());
        self.metrics.record_request("get_config", started.elapsed());

        match result {
            Ok(output) => {
                session.end(true, None);
                GatewayResponse::ok(CommandResult { output })
            }
            Err(e) => {
                self.metrics.record_error("get_config");
                session.end(false, Some(&e.message));
                GatewayResponse::from_result(Err(GatewayError::from(e)))
            }
        }
    }

    pub fn check_reachability(&self, request: &SessionRequest) -> GatewayResponse<ConnectResult> {
        let session_id = Self::session_id(request);
        let session = OperationSession::start("check_reachability", request.host.clone(), session_id);
        let started = Instant::now();

        let result = self.service.check_connectivity(request);
        self.metrics.record_device_reachability(&request.host, result.is_ok(), started.elapsed());
        self.metrics.record_request("check_reachability", started.elapsed());

        match result {
            Ok(reachable) => {
                session.end(true, None);
                GatewayResponse::ok(ConnectResult { reachable })
            }
            Err(e) => {
                self.metrics.record_error("check_reachability");
                session.end(false, Some(&e.message));
                GatewayResponse::from_result(Err(GatewayError::from(e)))
            }
        }
    }

    /// Synchronous, request-scoped backup: runs the device's capability
    /// command sequence and returns the running config directly, rather
    /// than going through the scheduler's `BackupTaskHandler` (there is no
    /// job here for the scheduler to track).
    pub fn backup_device(&self, request: &SessionRequest) -> GatewayResponse<BackupResult> {
        let session_id = Self::session_id(request);
        let session = OperationSession::start("backup_device", request.host.clone(), session_id);
        let started = Instant::now();

        let outcome = self.run_backup(request);
        let success = outcome.is_ok();
        let size_bytes = outcome.as_ref().map(|r| r.running_config.len()).unwrap_or(0);
        self.metrics.record_device_backup(&request.host, success, started.elapsed(), size_bytes);
        self.metrics.record_request("backup_device", started.elapsed());

        match outcome {
            Ok(result) => {
                session.end(true, None);
                GatewayResponse::ok(result)
            }
            Err(e) => {
                self.metrics.record_error("backup_device");
                let message = e.to_string();
                session.end(false, Some(&message));
                GatewayResponse::error(message)
            }
        }
    }

    fn run_backup(&self, request: &SessionRequest) -> Result<BackupResult> {
        let device_type = request.device_type;
        let mut running_config = String::new();
        let mut version_output = String::new();

        for (key, command) in capabilities::command_sequence(device_type) {
            let output = self.service.execute_command(request, &command, None)?;
            if key == capabilities::KEY_SHOW_VERSION {
                version_output = output.clone();
            }
            if key == capabilities::KEY_SHOW_RUNNING {
                running_config = output;
            }
        }

        let parsed = capabilities::parse_capabilities(device_type, &version_output);
        if parsed.flags.supports_config_replace {
            if let Some(save_command) = capabilities::command(device_type, capabilities::KEY_SAVE_CONFIG) {
                self.service.execute_command(request, save_command, None)?;
            }
        }

        if running_config.is_empty() {
            return Err(GatewayError::from(DeviceError::new(
                DeviceErrorKind::CommandError,
                "device did not return a running configuration".to_string(),
            )));
        }

        Ok(BackupResult { running_config, model: parsed.model, version: parsed.version })
    }
}
