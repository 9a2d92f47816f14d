pub mod capabilities;
pub mod channel;
pub mod config;
pub mod error;
pub mod logging;
pub mod pool;
pub mod protocol;
pub mod service;
pub mod ssh_adapter;

#[macro_use]
extern crate lazy_static;

// Common regex patterns shared across protocol adapters.
pub mod patterns {
    use regex::Regex;

    lazy_static! {
        pub static ref PROMPT_PATTERN: Regex = Regex::new(r"[>#]$").unwrap();
        pub static ref CONFIG_PROMPT_PATTERN: Regex = Regex::new(r"\(config[^)]*\)#$").unwrap();
        pub static ref ANSI_ESCAPE_PATTERN: Regex = Regex::new(r"\x1b\[[0-9;]*[a-zA-Z]").unwrap();
        pub static ref CRLF_PATTERN: Regex = Regex::new(r"\r\n").unwrap();
    }
}

pub use capabilities::{DeviceType, ParsedCapabilities};
pub use config::{NetsshConfig, NetsshConfigBuilder};
pub use error::{DeviceError, DeviceErrorKind, NetsshError};
pub use logging::init_logging;
pub use pool::{ConnectionPool, PoolStatus};
pub use protocol::{ConnectionKey, ProtocolAdapter, ProtocolAdapterFactory};
pub use service::DeviceCommunicationService;
