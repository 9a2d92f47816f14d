//! Process-wide connection pool: reuses live protocol adapters per
//! [`ConnectionKey`], enforces per-host and total size caps, and evicts
//! idle entries on a cooperative schedule.

use crate::capabilities::DeviceType;
use crate::error::{DeviceError, DeviceErrorKind};
use crate::protocol::{AdapterSpec, Credentials, ProtocolAdapter, ProtocolAdapterFactory, ConnectionKey};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

struct ConnectionPoolEntry {
    adapter: Box<dyn ProtocolAdapter>,
    last_used: Instant,
    in_use: bool,
    failed: bool,
}

impl ConnectionPoolEntry {
    fn check_alive(&self) -> bool {
        self.adapter.is_connected()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PoolStatus {
    pub total: usize,
    pub active: usize,
    pub idle: usize,
    pub hosts: usize,
    pub max_size: usize,
    pub max_per_host: usize,
    pub idle_timeout_seconds: u64,
    pub last_cleanup_seconds_ago: u64,
}

struct PoolState {
    entries: HashMap<ConnectionKey, Vec<ConnectionPoolEntry>>,
    host_connections: HashMap<String, HashSet<ConnectionKey>>,
    last_cleanup: Instant,
}

/// Parameters needed to borrow or create a connection.
pub struct BorrowRequest {
    pub protocol: String,
    pub host: String,
    pub username: String,
    pub password: Option<String>,
    pub secret: Option<String>,
    pub device_type: DeviceType,
    pub port: Option<u16>,
    pub device_id: Option<String>,
}

pub struct ConnectionPool {
    max_size: usize,
    max_per_host: usize,
    idle_timeout: Duration,
    cleanup_interval: Duration,
    state: Mutex<PoolState>,
}

impl ConnectionPool {
    pub fn new(max_size: usize, idle_timeout_seconds: u64, max_per_host: usize, cleanup_interval_seconds: u64) -> Self {
        Self {
            max_size,
            max_per_host,
            idle_timeout: Duration::from_secs(idle_timeout_seconds),
            cleanup_interval: Duration::from_secs(cleanup_interval_seconds),
            state: Mutex::new(PoolState {
                entries: HashMap::new(),
                host_connections: HashMap::new(),
                last_cleanup: Instant::now(),
            }),
        }
    }

    /// Borrow an adapter for the given connection parameters, reusing a live
    /// entry when one exists and creating a fresh one otherwise. Fails fast
    /// with `POOL_EXHAUSTED` when per-host or total caps are reached; never
    /// blocks waiting for capacity to free up.
    pub fn borrow(&self, request: BorrowRequest) -> Result<PooledAdapter<'_>, DeviceError> {
        let key = ConnectionKey::new(
            &request.protocol,
            &request.host,
            request.port,
            Some(&request.username),
            request.device_id.as_deref(),
        );

        let mut state = self.state.lock().unwrap();
        self.maybe_cleanup_locked(&mut state);

        if let Some(entries) = state.entries.get_mut(&key) {
            let mut dead_indices = Vec::new();
            let mut reuse_index = None;
            for (i, entry) in entries.iter().enumerate() {
                if entry.in_use || entry.failed {
                    continue;
                }
                if entry.check_alive() {
                    reuse_index = Some(i);
                    break;
                } else {
                    dead_indices.push(i);
                }
            }
            for i in dead_indices.into_iter().rev() {
                let mut dead = entries.remove(i);
                if let Err(e) = dead.adapter.disconnect() {
                    debug!(target: "ConnectionPool::borrow", "error disconnecting dead entry: {}", e);
                }
            }
            if let Some(i) = reuse_index {
                entries[i].in_use = true;
                entries[i].last_used = Instant::now();
                debug!(target: "ConnectionPool::borrow", "reusing connection to {}", request.host);
                return Ok(PooledAdapter { pool: self, key: Some(key) });
            }
        }

        let host_count = state
            .host_connections
            .get(&request.host)
            .map(|s| s.len())
            .unwrap_or(0);
        if host_count >= self.max_per_host {
            warn!(target: "ConnectionPool::borrow", "max connections per host reached for {}", request.host);
            return Err(DeviceError::pool_exhausted(format!(
                "maximum connections per host reached for {}",
                request.host
            ))
            .with_host(&request.host)
            .with_detail("max_per_host", self.max_per_host as u64));
        }

        if pool_size(&state) >= self.max_size {
            warn!(target: "ConnectionPool::borrow", "connection pool is full");
            self.cleanup_idle_locked(&mut state);
            if pool_size(&state) >= self.max_size {
                return Err(DeviceError::pool_exhausted("connection pool is full")
                    .with_detail("max_size", self.max_size as u64));
            }
        }

        debug!(target: "ConnectionPool::borrow", "creating new connection to {}", request.host);
        let spec = AdapterSpec {
            protocol: request.protocol.clone(),
            host: request.host.clone(),
            credentials: Credentials {
                username: request.username.clone(),
                password: request.password.clone(),
                secret: request.secret.clone(),
            },
            device_type: request.device_type,
            port: request.port,
            device_id: request.device_id.clone(),
        };

        let mut adapter = ProtocolAdapterFactory::create(spec)?;
        if let Err(e) = adapter.connect() {
            if let Err(disconnect_err) = adapter.disconnect() {
                debug!(target: "ConnectionPool::borrow", "error disconnecting failed adapter: {}", disconnect_err);
            }
            return Err(e);
        }

        let entry = ConnectionPoolEntry {
            adapter,
            last_used: Instant::now(),
            in_use: true,
            failed: false,
        };
        state.entries.entry(key.clone()).or_default().push(entry);
        state
            .host_connections
            .entry(request.host.clone())
            .or_default()
            .insert(key.clone());

        debug!(target: "ConnectionPool::borrow", "created new connection to {}", request.host);
        Ok(PooledAdapter { pool: self, key: Some(key) })
    }

    fn return_by_key(&self, key: &ConnectionKey) {
        let mut state = self.state.lock().unwrap();
        if let Some(entries) = state.entries.get_mut(key) {
            if let Some(entry) = entries.iter_mut().find(|e| e.in_use) {
                entry.in_use = false;
                entry.last_used = Instant::now();
                return;
            }
        }
        warn!(target: "ConnectionPool::return_connection", "connection not found in pool for key {:?}", key.host);
    }

    fn close_by_key(&self, key: &ConnectionKey) {
        let mut state = self.state.lock().unwrap();
        let mut remove_key = false;
        if let Some(entries) = state.entries.get_mut(key) {
            if let Some(pos) = entries.iter().position(|_| true) {
                let mut entry = entries.remove(pos);
                if let Err(e) = entry.adapter.disconnect() {
                    debug!(target: "ConnectionPool::close", "error disconnecting connection: {}", e);
                }
            }
            if entries.is_empty() {
                remove_key = true;
            }
        }
        if remove_key {
            state.entries.remove(key);
            if let Some(hosts) = state.host_connections.get_mut(&key.host) {
                hosts.remove(key);
                if hosts.is_empty() {
                    state.host_connections.remove(&key.host);
                }
            }
        }
    }

    pub fn close_all(&self) {
        let mut state = self.state.lock().unwrap();
        info!(target: "ConnectionPool::close_all", "closing all connections in the pool");
        for entries in state.entries.values_mut() {
            for entry in entries.iter_mut() {
                if let Err(e) = entry.adapter.disconnect() {
                    debug!(target: "ConnectionPool::close_all", "error disconnecting connection: {}", e);
                }
            }
        }
        state.entries.clear();
        state.host_connections.clear();
    }

    fn maybe_cleanup_locked(&self, state: &mut PoolState) {
        if state.last_cleanup.elapsed() > self.cleanup_interval {
            self.cleanup_idle_locked(state);
            state.last_cleanup = Instant::now();
        }
    }

    fn cleanup_idle_locked(&self, state: &mut PoolState) {
        debug!(target: "ConnectionPool::cleanup", "cleaning up idle connections");
        let idle_timeout = self.idle_timeout;
        let mut empty_keys = Vec::new();

        for (key, entries) in state.entries.iter_mut() {
            let mut i = 0;
            while i < entries.len() {
                let evict = !entries[i].in_use && entries[i].last_used.elapsed() > idle_timeout;
                if evict {
                    let mut entry = entries.remove(i);
                    if let Err(e) = entry.adapter.disconnect() {
                        debug!(target: "ConnectionPool::cleanup", "error disconnecting idle connection: {}", e);
                    }
                } else {
                    i += 1;
                }
            }
            if entries.is_empty() {
                empty_keys.push(key.clone());
            }
        }

        for key in empty_keys {
            state.entries.remove(&key);
            if let Some(hosts) = state.host_connections.get_mut(&key.host) {
                hosts.remove(&key);
                if hosts.is_empty() {
                    state.host_connections.remove(&key.host);
                }
            }
        }
    }

    pub fn status(&self) -> PoolStatus {
        let state = self.state.lock().unwrap();
        let total = pool_size(&state);
        let active = state
            .entries
            .values()
            .flat_map(|entries| entries.iter())
            .filter(|e| e.in_use)
            .count();
        PoolStatus {
            total,
            active,
            idle: total - active,
            hosts: state.host_connections.len(),
            max_size: self.max_size,
            max_per_host: self.max_per_host,
            idle_timeout_seconds: self.idle_timeout.as_secs(),
            last_cleanup_seconds_ago: state.last_cleanup.elapsed().as_secs(),
        }
    }
}

fn pool_size(state: &PoolState) -> usize {
    state.entries.values().map(|v| v.len()).sum()
}

/// A borrowed adapter scoped to the pool it came from. The caller accesses
/// the adapter through [`PooledAdapter::adapter_mut`] and must call
/// [`PooledAdapter::release`] or [`PooledAdapter::evict`] exactly once;
/// dropping without either logs a warning and leaks the entry as in-use
/// (callers should prefer explicit release via the Device Communication
/// Service rather than relying on Drop).
pub struct PooledAdapter<'p> {
    pool: &'p ConnectionPool,
    key: Option<ConnectionKey>,
}

impl<'p> PooledAdapter<'p> {
    fn with_adapter<R>(&self, f: impl FnOnce(&mut dyn ProtocolAdapter) -> R) -> Option<R> {
        let key = self.key.as_ref()?;
        let mut state = self.pool.state.lock().unwrap();
        let entry = state.entries.get_mut(key)?.iter_mut().find(|e| e.in_use)?;
        Some(f(entry.adapter.as_mut()))
    }

    pub fn send_command(&self, command: &str, timeout: Option<Duration>) -> Result<String, DeviceError> {
        self.with_adapter(|a| a.send_command(command, timeout))
            .unwrap_or_else(|| {
                Err(DeviceError::new(DeviceErrorKind::UnknownError, "pooled entry vanished mid-use"))
            })
    }

    pub fn get_config(&self, kind: crate::protocol::ConfigKind) -> Result<String, DeviceError> {
        self.with_adapter(|a| a.get_config(kind))
            .unwrap_or_else(|| {
                Err(DeviceError::new(DeviceErrorKind::UnknownError, "pooled entry vanished mid-use"))
            })
    }

    pub fn check_connectivity(&self) -> bool {
        self.with_adapter(|a| a.check_connectivity()).unwrap_or(false)
    }

    pub fn release(mut self) {
        if let Some(key) = self.key.take() {
            self.pool.return_by_key(&key);
        }
    }

    pub fn evict(mut self) {
        if let Some(key) = self.key.take() {
            self.pool.close_by_key(&key);
        }
    }
}

impl<'p> Drop for PooledAdapter<'p> {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            warn!(target: "PooledAdapter::drop", "pooled adapter dropped without release/evict, returning defensively");
            self.pool.return_by_key(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> ConnectionPool {
        ConnectionPool::new(2, 300, 1, 60)
    }

    fn request(host: &str) -> BorrowRequest {
        BorrowRequest {
            protocol: "ssh".to_string(),
            host: host.to_string(),
            username: "admin".to_string(),
            password: Some("pw".to_string()),
            secret: None,
            device_type: DeviceType::CiscoIos,
            port: None,
            device_id: None,
        }
    }

    #[test]
    fn status_on_empty_pool_reports_zero_everywhere() {
        let p = pool();
        let status = p.status();
        assert_eq!(status.total, 0);
        assert_eq!(status.active, 0);
        assert_eq!(status.hosts, 0);
        assert_eq!(status.max_size, 2);
        assert_eq!(status.max_per_host, 1);
    }

    #[test]
    fn borrow_fails_with_unsupported_protocol_before_touching_capacity() {
        let p = pool();
        let mut req = request("10.0.0.1");
        req.protocol = "telnet".to_string();
        let err = p.borrow(req).unwrap_err();
        assert_eq!(err.kind, DeviceErrorKind::ProtocolUnsupported);
        assert_eq!(p.status().total, 0);
    }
}
