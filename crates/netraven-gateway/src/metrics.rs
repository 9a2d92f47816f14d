//! Gateway metrics: counters, a gauge and histograms recorded through the
//! `metrics` facade crate, taking whatever recorder the embedding process
//! installs (Prometheus exporter, statsd, or none at all in tests).

use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

/// Tracks which device hosts currently have an open connection, so the
/// `connected_devices` gauge only counts a host once no matter how many
/// requests are in flight for it.
#[derive(Default)]
pub struct GatewayMetrics {
    connected_hosts: Mutex<HashSet<String>>,
}

impl GatewayMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request(&self, endpoint: &str, latency: Duration) {
        metrics::counter!("gateway_requests_total", "endpoint" => endpoint.to_string()).increment(1);
        metrics::histogram!("gateway_request_latency_seconds", "endpoint" => endpoint.to_string())
            .record(latency.as_secs_f64());
    }

    pub fn record_error(&self, error_type: &str) {
        metrics::counter!("gateway_errors_total", "error_type" => error_type.to_string()).increment(1);
    }

    pub fn record_device_connection(&self, host: &str, success: bool, latency: Duration) {
        metrics::counter!(
            "gateway_device_connections_total",
            "host" => host.to_string(),
            "success" => success.to_string()
        )
        .increment(1);
        metrics::histogram!("gateway_device_connection_latency_seconds", "host" => host.to_string())
            .record(latency.as_secs_f64());

        if success {
            let mut hosts = self.connected_hosts.lock().unwrap();
            if hosts.insert(host.to_string()) {
                metrics::gauge!("gateway_connected_devices").set(hosts.len() as f64);
            }
        }
    }

    pub fn record_device_disconnect(&self, host: &str) {
        let mut hosts = self.connected_hosts.lock().unwrap();
        if hosts.remove(host) {
            metrics::gauge!("gateway_connected_devices").set(hosts.len() as f64);
        }
    }

    pub fn record_device_command(&self, host: &str, success: bool, latency: Duration) {
        metrics::counter!(
            "gateway_device_commands_total",
            "host" => host.to_string(),
            "success" => success.to_string()
        )
        .increment(1);
        metrics::histogram!("gateway_device_command_latency_seconds", "host" => host.to_string())
            .record(latency.as_secs_f64());
    }

    pub fn record_device_backup(&self, host: &str, success: bool, latency: Duration, size_bytes: usize) {
        metrics::counter!(
            "gateway_device_backups_total",
            "host" => host.to_string(),
            "success" => success.to_string()
        )
        .increment(1);
        metrics::histogram!("gateway_device_backup_latency_seconds", "host" => host.to_string())
            .record(latency.as_secs_f64());
        metrics::histogram!("gateway_device_backup_size_bytes", "host" => host.to_string())
            .record(size_bytes as f64);
    }

    pub fn record_device_reachability(&self, host: &str, success: bool, latency: Duration) {
        metrics::counter!(
            "gateway_device_reachability_checks_total",
            "host" => host.to_string(),
            "success" => success.to_string()
        )
        .increment(1);
        metrics::histogram!("gateway_device_reachability_latency_seconds", "host" => host.to_string())
            .record(latency.as_secs_f64());
    }

    pub fn connected_device_count(&self) -> usize {
        self.connected_hosts.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connecting_the_same_host_twice_does_not_double_count() {
        let metrics = GatewayMetrics::new();
        metrics.record_device_connection("10.0.0.1", true, Duration::from_millis(5));
        metrics.record_device_connection("10.0.0.1", true, Duration::from_millis(5));
        assert_eq!(metrics.connected_device_count(), 1);
    }

    #[test]
    fn disconnecting_removes_the_host() {
        let metrics = GatewayMetrics::new();
        metrics.record_device_connection("10.0.0.1", true, Duration::from_millis(5));
        metrics.record_device_disconnect("10.0.0.1");
        assert_eq!(metrics.connected_device_count(), 0);
    }

    #[test]
    fn failed_connection_does_not_register_as_connected() {
        let metrics = GatewayMetrics::new();
        metrics.record_device_connection("10.0.0.1", false, Duration::from_millis(5));
        assert_eq!(metrics.connected_device_count(), 0);
    }
}
