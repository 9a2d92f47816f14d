//! Per-job execution log. Exactly one logging service: the scheduler and
//! worker loop share it rather than maintaining duplicate job-status and
//! job-completion logs.

use crate::model::JobStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobLogEntry {
    pub timestamp: DateTime<Utc>,
    pub status: JobStatus,
    pub message: Option<String>,
    pub execution_time_ms: Option<i64>,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
}

/// Append-only `job_id -> Vec<JobLogEntry>` log, read back via
/// `get_job_logs` for status/history queries.
#[derive(Default)]
pub struct JobLoggingService {
    logs: Mutex<HashMap<String, Vec<JobLogEntry>>>,
}

impl JobLoggingService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log_job_status(&self, job_id: &str, status: JobStatus, message: Option<String>) {
        debug!(target: "JobLoggingService", job_id, ?status, "job status");
        self.push(
            job_id,
            JobLogEntry {
                timestamp: Utc::now(),
                status,
                message,
                execution_time_ms: None,
                result: None,
                error: None,
            },
        );
    }

    pub fn log_job_start(&self, job_id: &str) {
        self.log_job_status(job_id, JobStatus::Running, None);
    }

    pub fn log_job_completion(
        &self,
        job_id: &str,
        started_at: DateTime<Utc>,
        success: bool,
        result: serde_json::Value,
    ) {
        let execution_time_ms = (Utc::now() - started_at).num_milliseconds();
        let status = if success { JobStatus::Completed } else { JobStatus::Failed };
        self.push(
            job_id,
            JobLogEntry {
                timestamp: Utc::now(),
                status,
                message: None,
                execution_time_ms: Some(execution_time_ms),
                result: Some(result),
                error: None,
            },
        );
    }

    pub fn log_job_failure(&self, job_id: &str, started_at: DateTime<Utc>, error: impl Into<String>) {
        let execution_time_ms = (Utc::now() - started_at).num_milliseconds();
        self.push(
            job_id,
            JobLogEntry {
                timestamp: Utc::now(),
                status: JobStatus::Failed,
                message: None,
                execution_time_ms: Some(execution_time_ms),
                result: None,
                error: Some(error.into()),
            },
        );
    }

    pub fn get_job_logs(&self, job_id: &str) -> Vec<JobLogEntry> {
        self.logs.lock().unwrap().get(job_id).cloned().unwrap_or_default()
    }

    fn push(&self, job_id: &str, entry: JobLogEntry) {
        self.logs.lock().unwrap().entry(job_id.to_string()).or_default().push(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logs_accumulate_per_job_in_order() {
        let svc = JobLoggingService::new();
        svc.log_job_start("job-1");
        svc.log_job_completion("job-1", Utc::now(), true, serde_json::json!({"ok": true}));
        let logs = svc.get_job_logs("job-1");
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].status, JobStatus::Running);
        assert_eq!(logs[1].status, JobStatus::Completed);
    }

    #[test]
    fn failure_records_error_and_failed_status() {
        let svc = JobLoggingService::new();
        svc.log_job_failure("job-2", Utc::now(), "boom");
        let logs = svc.get_job_logs("job-2");
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].status, JobStatus::Failed);
        assert_eq!(logs[0].error.as_deref(), Some("boom"));
    }

    #[test]
    fn unknown_job_has_no_logs() {
        let svc = JobLoggingService::new();
        assert!(svc.get_job_logs("nope").is_empty());
    }
}
