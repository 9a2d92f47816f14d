use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("no handler registered for job type: {0}")]
    NoHandler(String),

    #[error("handler already registered for job type: {0}")]
    HandlerAlreadyRegistered(String),

    #[error("job not found: {0}")]
    JobNotFound(String),

    #[error("invalid job definition: {0}")]
    InvalidJobDefinition(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unsupported schedule: {0}")]
    UnsupportedSchedule(String),

    #[error("device error: {0}")]
    Device(#[from] netraven_core::error::DeviceError),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
