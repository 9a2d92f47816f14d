use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SharedConfigError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Environment error: {0}")]
    Environment(String),
}

pub type Result<T> = std::result::Result<T, SharedConfigError>;

/// Configuration that applies regardless of which crate is running.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    pub log_level: String,
    pub environment: String,
    pub log_to_file: bool,
    pub log_file_path: Option<String>,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            environment: "development".to_string(),
            log_to_file: false,
            log_file_path: None,
        }
    }
}

/// Connection pool tuning, see `pool.*` in the enumerated configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    pub max_size: usize,
    pub max_per_host: usize,
    pub idle_timeout_seconds: u64,
    pub cleanup_interval_seconds: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_size: 50,
            max_per_host: 5,
            idle_timeout_seconds: 300,
            cleanup_interval_seconds: 60,
        }
    }
}

/// Job scheduler tuning, see `scheduler.*` in the enumerated configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub num_workers: usize,
    pub queue_poll_interval_seconds: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            num_workers: 5,
            queue_poll_interval_seconds: 1.0,
        }
    }
}

/// Command execution defaults, see `command.*` in the enumerated configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandConfig {
    pub default_timeout_seconds: u64,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            default_timeout_seconds: 30,
        }
    }
}

/// Main configuration structure aggregating every crate's section.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WorkspaceConfig {
    pub global: GlobalConfig,
    pub pool: PoolConfig,
    pub scheduler: SchedulerConfig,
    pub command: CommandConfig,
}

impl WorkspaceConfig {
    /// Load configuration from `config.toml` at the workspace root, then
    /// overlay environment variables prefixed with `NETRAVEN_`.
    pub fn load() -> Result<Self> {
        let mut config_builder = Config::builder();

        if let Ok(workspace_root) = find_workspace_root() {
            let config_file = workspace_root.join("config.toml");
            if config_file.exists() {
                config_builder = config_builder.add_source(File::from(config_file));
            }
        }

        config_builder = config_builder.add_source(
            Environment::with_prefix("NETRAVEN")
                .separator("_")
                .try_parsing(true),
        );

        let config = config_builder.build()?;

        Ok(WorkspaceConfig {
            global: GlobalConfig {
                log_level: config
                    .get("global.log_level")
                    .unwrap_or_else(|_| "info".to_string()),
                environment: config
                    .get("global.environment")
                    .unwrap_or_else(|_| "development".to_string()),
                log_to_file: config.get("global.log_to_file").unwrap_or(false),
                log_file_path: config.get("global.log_file_path").ok(),
            },
            pool: PoolConfig {
                max_size: config.get("pool.max_size").unwrap_or(50),
                max_per_host: config.get("pool.max_per_host").unwrap_or(5),
                idle_timeout_seconds: config.get("pool.idle_timeout_seconds").unwrap_or(300),
                cleanup_interval_seconds: config
                    .get("pool.cleanup_interval_seconds")
                    .unwrap_or(60),
            },
            scheduler: SchedulerConfig {
                num_workers: config.get("scheduler.num_workers").unwrap_or(5),
                queue_poll_interval_seconds: config
                    .get("scheduler.queue_poll_interval_seconds")
                    .unwrap_or(1.0),
            },
            command: CommandConfig {
                default_timeout_seconds: config
                    .get("command.default_timeout_seconds")
                    .unwrap_or(30),
            },
        })
    }

    pub fn global(&self) -> &GlobalConfig {
        &self.global
    }

    pub fn pool(&self) -> &PoolConfig {
        &self.pool
    }

    pub fn scheduler(&self) -> &SchedulerConfig {
        &self.scheduler
    }

    pub fn command(&self) -> &CommandConfig {
        &self.command
    }
}

/// Find the workspace root directory by looking for a Cargo.toml with `[workspace]`.
fn find_workspace_root() -> Result<PathBuf> {
    let mut current_dir = std::env::current_dir()?;

    loop {
        let cargo_toml = current_dir.join("Cargo.toml");
        if cargo_toml.exists() {
            let content = std::fs::read_to_string(&cargo_toml)?;
            if content.contains("[workspace]") {
                return Ok(current_dir);
            }
        }

        if let Some(parent) = current_dir.parent() {
            current_dir = parent.to_path_buf();
        } else {
            break;
        }
    }

    Err(SharedConfigError::Environment(
        "Could not find workspace root directory".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_enumerated_configuration() {
        let cfg = WorkspaceConfig::default();
        assert_eq!(cfg.pool.max_size, 50);
        assert_eq!(cfg.pool.max_per_host, 5);
        assert_eq!(cfg.pool.idle_timeout_seconds, 300);
        assert_eq!(cfg.pool.cleanup_interval_seconds, 60);
        assert_eq!(cfg.scheduler.num_workers, 5);
        assert_eq!(cfg.scheduler.queue_poll_interval_seconds, 1.0);
        assert_eq!(cfg.command.default_timeout_seconds, 30);
    }
}
