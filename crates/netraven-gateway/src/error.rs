use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("device error: {0}")]
    Device(#[from] netraven_core::error::DeviceError),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, GatewayError>;

/// The `{status, message, data}` shape every facade operation collapses
/// its outcome to.
#[derive(Debug, Clone, Serialize)]
pub struct GatewayResponse<T: Serialize> {
    pub status: &'static str,
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T: Serialize> GatewayResponse<T> {
    pub fn ok(data: T) -> Self {
        Self { status: "success", message: None, data: Some(data) }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { status: "error", message: Some(message.into()), data: None }
    }

    pub fn from_result(result: Result<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::error(e.to_string()),
        }
    }
}
