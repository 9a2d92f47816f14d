//! Reference task handlers: `backup` and `command_execution`. Both take a
//! shared device communication service at construction and validate
//! required parameters eagerly, before any network activity starts.

use crate::error::{Result, SchedulerError};
use crate::model::{HandlerResult, Job, TaskHandler};
use netraven_core::capabilities::{self, DeviceType};
use netraven_core::protocol::ConfigKind;
use netraven_core::service::{DeviceCommunicationService, SessionRequest};
use serde_json::{Map, Value};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

fn session_request(job: &Job) -> Result<SessionRequest> {
    let def = &job.definition;
    let host = def
        .get_str("host")
        .ok_or_else(|| SchedulerError::InvalidArgument("job requires a 'host' parameter".to_string()))?
        .to_string();
    let username = def
        .get_str("username")
        .ok_or_else(|| SchedulerError::InvalidArgument("job requires a 'username' parameter".to_string()))?
        .to_string();
    let password = def
        .get_str("password")
        .ok_or_else(|| SchedulerError::InvalidArgument("job requires a 'password' parameter".to_string()))?
        .to_string();
    let device_id = def
        .get_str("device_id")
        .ok_or_else(|| SchedulerError::InvalidArgument("job requires a 'device_id' parameter".to_string()))?
        .to_string();
    let protocol = def.get_str("protocol").unwrap_or("ssh").to_string();
    let device_type = def
        .get_str("device_type")
        .map(DeviceType::from_str)
        .transpose()
        .unwrap_or(None)
        .unwrap_or(DeviceType::Default);

    Ok(SessionRequest {
        protocol,
        host,
        username,
        password: Some(password),
        secret: def.get_str("secret").map(str::to_string),
        device_type,
        port: def.parameters.get("port").and_then(|v| v.as_u64()).map(|p| p as u16),
        device_id: Some(device_id),
        session_id: None,
    })
}

/// Runs the device's full capability command sequence, parses the version
/// output and conditionally saves the running config.
pub struct BackupTaskHandler {
    service: Arc<DeviceCommunicationService>,
}

impl BackupTaskHandler {
    pub fn new(service: Arc<DeviceCommunicationService>) -> Self {
        Self { service }
    }
}

impl TaskHandler for BackupTaskHandler {
    fn execute(&self, job: &Job) -> Result<HandlerResult> {
        let request = session_request(job)?;
        let device_id = request.device_id.clone().unwrap_or_default();
        let host = request.host.clone();
        let save_config = job
            .definition
            .parameters
            .get("save_config")
            .and_then(|v| v.as_bool())
            .unwrap_or(true);

        let device_type = request.device_type;
        let sequence = capabilities::command_sequence(device_type);

        let mut outputs: Map<String, Value> = Map::new();
        let mut version_output = String::new();
        for (key, command) in &sequence {
            let output = self.service.execute_command(&request, command, None)?;
            if *key == capabilities::KEY_SHOW_VERSION {
                version_output = output.clone();
            }
            outputs.insert((*key).to_string(), Value::from(output));
        }

        let parsed = capabilities::parse_capabilities(device_type, &version_output);

        let mut config_saved = false;
        if save_config {
            if let Some(save_command) = capabilities::command(device_type, capabilities::KEY_SAVE_CONFIG) {
                if !save_command.is_empty() {
                    self.service.execute_command(&request, save_command, None)?;
                    config_saved = true;
                }
            }
        }

        let running_config = outputs
            .get(capabilities::KEY_SHOW_RUNNING)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        let mut data = Map::new();
        data.insert("device_id".to_string(), Value::from(device_id));
        data.insert("host".to_string(), Value::from(host));
        data.insert("config_saved".to_string(), Value::from(config_saved));
        data.insert("config_size".to_string(), Value::from(running_config.len() as u64));
        data.insert("running_config".to_string(), Value::from(running_config));
        data.insert("model".to_string(), Value::from(parsed.model.unwrap_or_default()));
        data.insert("version".to_string(), Value::from(parsed.version.unwrap_or_default()));
        data.insert("serial".to_string(), Value::from(parsed.serial.unwrap_or_default()));

        let mut result = HandlerResult::ok(data);
        result.message = Some("backup completed successfully".to_string());
        Ok(result)
    }
}

/// Executes a single ad-hoc command (the `command` parameter) and returns
/// its raw output, or the config of the requested kind when `command` is
/// the literal `get_config` sentinel.
pub struct CommandExecutionHandler {
    service: Arc<DeviceCommunicationService>,
}

impl CommandExecutionHandler {
    pub fn new(service: Arc<DeviceCommunicationService>) -> Self {
        Self { service }
    }
}

impl TaskHandler for CommandExecutionHandler {
    fn execute(&self, job: &Job) -> Result<HandlerResult> {
        let request = session_request(job)?;
        let device_id = request.device_id.clone().unwrap_or_default();
        let host = request.host.clone();
        let command = job
            .definition
            .get_str("command")
            .ok_or_else(|| SchedulerError::InvalidArgument("job requires a 'command' parameter".to_string()))?
            .to_string();

        let timeout = job
            .definition
            .parameters
            .get("timeout_seconds")
            .and_then(|v| v.as_u64())
            .map(Duration::from_secs);

        let base_data = |device_id: &str, host: &str, command: &str| -> Map<String, Value> {
            let mut data = Map::new();
            data.insert("device_id".to_string(), Value::from(device_id.to_string()));
            data.insert("host".to_string(), Value::from(host.to_string()));
            data.insert("command".to_string(), Value::from(command.to_string()));
            data
        };

        if command == "get_config" {
            let kind = match job.definition.get_str("config_kind") {
                Some("startup") => ConfigKind::Startup,
                Some("candidate") => ConfigKind::Candidate,
                _ => ConfigKind::Running,
            };
            let config = self.service.get_config(&request, kind)?;
            let mut data = base_data(&device_id, &host, &command);
            data.insert("output".to_string(), Value::from(config));
            data.insert("exit_code".to_string(), Value::from(0));
            let mut result = HandlerResult::ok(data);
            result.message = Some("command executed successfully".to_string());
            return Ok(result);
        }

        match self.service.execute_command(&request, &command, timeout) {
            Ok(output) => {
                let mut data = base_data(&device_id, &host, &command);
                data.insert("output".to_string(), Value::from(output));
                data.insert("exit_code".to_string(), Value::from(0));
                let mut result = HandlerResult::ok(data);
                result.message = Some("command executed successfully".to_string());
                Ok(result)
            }
            Err(e) if !e.kind.is_retryable() => {
                warn!(target: "CommandExecutionHandler", host = %request.host, "command failed: {}", e);
                let mut data = base_data(&device_id, &host, &command);
                data.insert("output".to_string(), Value::from(""));
                data.insert("exit_code".to_string(), Value::from(1));
                let mut result = HandlerResult::failure(e.message);
                result.data = data;
                Ok(result)
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{JobDefinition, JobPriority, ScheduleType};

    fn job_with(params: &[(&str, &str)]) -> Job {
        let mut def = JobDefinition::new("command_execution", ScheduleType::Immediate)
            .with_priority(JobPriority::Normal);
        for (k, v) in params {
            def = def.with_parameter(*k, Value::from(*v));
        }
        Job::from_definition(def)
    }

    #[test]
    fn session_request_rejects_missing_host() {
        let job = job_with(&[("username", "admin")]);
        assert!(session_request(&job).is_err());
    }

    #[test]
    fn session_request_rejects_missing_username() {
        let job = job_with(&[("host", "10.0.0.1")]);
        assert!(session_request(&job).is_err());
    }

    #[test]
    fn session_request_rejects_missing_password() {
        let job = job_with(&[("host", "10.0.0.1"), ("username", "admin"), ("device_id", "dev1")]);
        assert!(session_request(&job).is_err());
    }

    #[test]
    fn session_request_rejects_missing_device_id() {
        let job = job_with(&[("host", "10.0.0.1"), ("username", "admin"), ("password", "secret")]);
        assert!(session_request(&job).is_err());
    }

    #[test]
    fn session_request_defaults_protocol_to_ssh_and_device_type_to_default() {
        let job = job_with(&[
            ("host", "10.0.0.1"),
            ("username", "admin"),
            ("password", "secret"),
            ("device_id", "dev1"),
        ]);
        let req = session_request(&job).unwrap();
        assert_eq!(req.protocol, "ssh");
        assert_eq!(req.device_type, DeviceType::Default);
    }
}
