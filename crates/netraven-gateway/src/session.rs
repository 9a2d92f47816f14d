//! Session-scoped structured logging: every facade operation is bracketed
//! by a start/end `tracing` event sharing one `session_id`, so a log
//! aggregator can reconstruct the whole operation from either end.

use std::time::Instant;
use tracing::{info, warn};

/// RAII-ish helper: call [`OperationSession::end`] with the outcome once
/// the operation completes. Dropping without calling `end` is allowed (the
/// session simply never gets an end marker, e.g. on an early return from a
/// bug) but every facade method in this crate calls it on every path.
pub struct OperationSession {
    operation: &'static str,
    host: String,
    session_id: String,
    started: Instant,
}

impl OperationSession {
    pub fn start(operation: &'static str, host: String, session_id: String) -> Self {
        info!(
            target: "GatewaySession",
            operation,
            host = %host,
            session_id = %session_id,
            "operation started"
        );
        Self { operation, host, session_id, started: Instant::now() }
    }

    pub fn elapsed(&self) -> std::time::Duration {
        self.started.elapsed()
    }

    pub fn end(self, success: bool, detail: Option<&str>) {
        let elapsed = self.started.elapsed();
        if success {
            info!(
                target: "GatewaySession",
                operation = self.operation,
                host = %self.host,
                session_id = %self.session_id,
                elapsed_ms = elapsed.as_millis() as u64,
                "operation completed"
            );
        } else {
            warn!(
                target: "GatewaySession",
                operation = self.operation,
                host = %self.host,
                session_id = %self.session_id,
                elapsed_ms = elapsed.as_millis() as u64,
                detail,
                "operation failed"
            );
        }
    }
}
