//! Device Communication Service: a thin facade over the connection pool
//! that guarantees an adapter is released (or evicted) on every exit path.

use crate::capabilities::DeviceType;
use crate::error::{DeviceError, DeviceErrorKind};
use crate::pool::{BorrowRequest, ConnectionPool};
use crate::protocol::ConfigKind;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

/// Parameters shared by every facade operation.
pub struct SessionRequest {
    pub protocol: String,
    pub host: String,
    pub username: String,
    pub password: Option<String>,
    pub secret: Option<String>,
    pub device_type: DeviceType,
    pub port: Option<u16>,
    pub device_id: Option<String>,
    pub session_id: Option<String>,
}

impl SessionRequest {
    fn borrow_request(&self) -> BorrowRequest {
        BorrowRequest {
            protocol: self.protocol.clone(),
            host: self.host.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            secret: self.secret.clone(),
            device_type: self.device_type,
            port: self.port,
            device_id: self.device_id.clone(),
        }
    }

    fn session_id_or_new(&self) -> String {
        self.session_id.clone().unwrap_or_else(|| Uuid::new_v4().to_string())
    }
}

pub struct DeviceCommunicationService {
    pool: ConnectionPool,
}

impl DeviceCommunicationService {
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self, request), fields(host = %request.host), level = "debug", name = "DeviceCommunicationService::execute_command")]
    pub fn execute_command(
        &self,
        request: &SessionRequest,
        command: &str,
        timeout: Option<Duration>,
    ) -> Result<String, DeviceError> {
        let session_id = request.session_id_or_new();
        info!(target: "DeviceCommunicationService::execute_command", session_id = %session_id, "executing command on {}", request.host);

        let adapter = self.pool.borrow(request.borrow_request())?;
        let result = adapter.send_command(command, timeout);
        match result {
            Ok(output) => {
                adapter.release();
                Ok(output)
            }
            Err(e) => {
                adapter.release();
                Err(e.with_session_id(session_id))
            }
        }
    }

    #[instrument(skip(self, request, commands), fields(host = %request.host), level = "debug", name = "DeviceCommunicationService::execute_commands")]
    pub fn execute_commands(
        &self,
        request: &SessionRequest,
        commands: &[String],
        timeout: Option<Duration>,
    ) -> Result<HashMap<String, String>, DeviceError> {
        let session_id = request.session_id_or_new();
        info!(target: "DeviceCommunicationService::execute_commands", session_id = %session_id, "executing {} commands on {}", commands.len(), request.host);

        let adapter = self.pool.borrow(request.borrow_request())?;
        let mut results = HashMap::with_capacity(commands.len());
        for cmd in commands {
            match adapter.send_command(cmd, timeout) {
                Ok(output) => {
                    results.insert(cmd.clone(), output);
                }
                Err(e) => {
                    adapter.release();
                    return Err(e.with_session_id(session_id).with_commands(commands.to_vec()));
                }
            }
        }
        adapter.release();
        Ok(results)
    }

    #[instrument(skip(self, request), fields(host = %request.host), level = "debug", name = "DeviceCommunicationService::get_config")]
    pub fn get_config(&self, request: &SessionRequest, kind: ConfigKind) -> Result<String, DeviceError> {
        let session_id = request.session_id_or_new();
        let adapter = self.pool.borrow(request.borrow_request())?;
        let result = adapter.get_config(kind);
        match result {
            Ok(config) => {
                adapter.release();
                Ok(config)
            }
            Err(e) => {
                adapter.release();
                Err(e.with_session_id(session_id))
            }
        }
    }

    /// TCP-level reachability probe; borrows an adapter only long enough to
    /// check connectivity, then releases it regardless of outcome. A borrow
    /// failure itself surfaces as `CONNECTION_ERROR`, not the raw pool error,
    /// since a reachability check has no "command" context to report.
    #[instrument(skip(self, request), fields(host = %request.host), level = "debug", name = "DeviceCommunicationService::check_connectivity")]
    pub fn check_connectivity(&self, request: &SessionRequest) -> Result<bool, DeviceError> {
        match self.pool.borrow(request.borrow_request()) {
            Ok(adapter) => {
                let reachable = adapter.check_connectivity();
                adapter.release();
                Ok(reachable)
            }
            Err(e) if e.kind == DeviceErrorKind::PoolExhausted => Err(e),
            Err(e) => Err(DeviceError::new(DeviceErrorKind::ConnectionError, e.message)
                .with_host(&request.host)
                .with_cause(e)),
        }
    }
}
