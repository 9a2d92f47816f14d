use std::time::Duration;

/// Per-connection tuning for an SSH adapter. One instance is created for
/// every adapter the connection pool opens; nothing here is process-global
/// (see the design-notes guidance against ambient singletons).
#[derive(Debug, Clone)]
pub struct NetsshConfig {
    /// Default SSH port if not specified (default: 22)
    pub default_port: u16,

    /// Connection timeout; covers both TCP connect and SSH handshake.
    pub connection_timeout: Duration,

    /// Read timeout for channel operations.
    pub read_timeout: Duration,

    /// Write timeout for channel operations.
    pub write_timeout: Duration,

    /// Size of the read buffer in bytes.
    pub read_buffer_size: usize,

    /// Maximum time to wait for a prompt/pattern match.
    pub pattern_timeout: Duration,

    /// Number of retries for transient SSH session setup failures.
    pub retry_count: u32,

    /// Delay between retries.
    pub retry_delay: Duration,
}

impl Default for NetsshConfig {
    fn default() -> Self {
        Self {
            default_port: 22,
            connection_timeout: Duration::from_secs(60),
            read_timeout: Duration::from_secs(10),
            write_timeout: Duration::from_secs(10),
            read_buffer_size: 65536,
            pattern_timeout: Duration::from_secs(20),
            retry_count: 3,
            retry_delay: Duration::from_millis(1000),
        }
    }
}

impl NetsshConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> NetsshConfigBuilder {
        NetsshConfigBuilder::default()
    }
}

/// Fluent builder for [`NetsshConfig`].
#[derive(Default)]
pub struct NetsshConfigBuilder {
    config: NetsshConfig,
}

impl NetsshConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_port(mut self, port: u16) -> Self {
        self.config.default_port = port;
        self
    }

    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.config.connection_timeout = timeout;
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout = timeout;
        self
    }

    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.config.write_timeout = timeout;
        self
    }

    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.config.read_buffer_size = size;
        self
    }

    pub fn pattern_timeout(mut self, timeout: Duration) -> Self {
        self.config.pattern_timeout = timeout;
        self
    }

    pub fn retry_count(mut self, count: u32) -> Self {
        self.config.retry_count = count;
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.config.retry_delay = delay;
        self
    }

    pub fn build(self) -> NetsshConfig {
        self.config
    }
}
