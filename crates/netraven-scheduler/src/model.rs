//! Job, schedule and priority types shared by the queue, registry and
//! scheduler service.

use crate::error::{Result, SchedulerError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Queued,
    Pending,
    Running,
    Completed,
    Failed,
    Canceled,
    Paused,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed | JobStatus::Canceled)
    }
}

/// Higher numeric value sorts first. Mirrors the enumerated priority levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum JobPriority {
    Lowest = 10,
    Low = 30,
    Normal = 50,
    High = 80,
    Critical = 100,
}

impl JobPriority {
    pub fn value(self) -> i64 {
        self as i64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduleType {
    Immediate,
    OneTime,
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Cron,
}

/// A job's static definition: type, parameters, schedule and priority.
/// Schedule-specific parameters are validated and defaulted at construction
/// time, matching the original service's eager-validation behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDefinition {
    pub id: Option<String>,
    pub job_type: String,
    pub parameters: Map<String, Value>,
    pub schedule_type: ScheduleType,
    pub priority: JobPriority,
    pub name: Option<String>,
    pub description: Option<String>,
    /// Free-form, caller-supplied bag. Never interpreted by the scheduler.
    pub metadata: Option<Map<String, Value>>,
}

impl JobDefinition {
    pub fn new(job_type: impl Into<String>, schedule_type: ScheduleType) -> Self {
        Self {
            id: None,
            job_type: job_type.into(),
            parameters: Map::new(),
            schedule_type,
            priority: JobPriority::Normal,
            name: None,
            description: None,
            metadata: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_priority(mut self, priority: JobPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Fill in schedule-specific defaults and reject definitions missing a
    /// required parameter for their schedule type.
    pub fn validate(&mut self) -> Result<()> {
        match self.schedule_type {
            ScheduleType::OneTime => {
                if !self.parameters.contains_key("schedule_time") {
                    return Err(SchedulerError::InvalidJobDefinition(
                        "ONE_TIME schedule requires a 'schedule_time' parameter".to_string(),
                    ));
                }
            }
            ScheduleType::Daily => {
                self.parameters.entry("hour").or_insert(Value::from(0));
                self.parameters.entry("minute").or_insert(Value::from(0));
            }
            ScheduleType::Weekly => {
                self.parameters.entry("day_of_week").or_insert(Value::from(0));
                self.parameters.entry("hour").or_insert(Value::from(0));
                self.parameters.entry("minute").or_insert(Value::from(0));
            }
            ScheduleType::Monthly => {
                self.parameters.entry("day_of_month").or_insert(Value::from(1));
                self.parameters.entry("hour").or_insert(Value::from(0));
                self.parameters.entry("minute").or_insert(Value::from(0));
            }
            ScheduleType::Yearly => {
                self.parameters.entry("month").or_insert(Value::from(1));
                self.parameters.entry("day").or_insert(Value::from(1));
                self.parameters.entry("hour").or_insert(Value::from(0));
                self.parameters.entry("minute").or_insert(Value::from(0));
            }
            ScheduleType::Cron => {
                if !self.parameters.contains_key("cron_expression") {
                    return Err(SchedulerError::InvalidJobDefinition(
                        "CRON schedule requires a 'cron_expression' parameter".to_string(),
                    ));
                }
            }
            ScheduleType::Immediate => {}
        }
        Ok(())
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).and_then(|v| v.as_str())
    }

    pub fn get_i64(&self, key: &str, default: i64) -> i64 {
        self.parameters.get(key).and_then(|v| v.as_i64()).unwrap_or(default)
    }
}

/// One entry in a job's append-only execution history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub status: JobStatus,
    pub timestamp: DateTime<Utc>,
    pub message: Option<String>,
}

/// A definition plus its runtime state. `created_at`/`id` are immutable
/// once assigned; everything else is mutated only by the owning worker
/// until the job reaches a terminal status, at which point only
/// `execution_history` may still grow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub definition: JobDefinition,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub next_run: Option<DateTime<Utc>>,
    pub result: Map<String, Value>,
    pub error: Option<String>,
    /// Always 0 today; retry is not implemented. Present so the data model
    /// matches what collaborators expect to read.
    pub retry_count: u32,
    pub execution_history: Vec<ExecutionRecord>,
}

impl Job {
    pub fn from_definition(definition: JobDefinition) -> Self {
        Self {
            definition,
            status: JobStatus::Queued,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            next_run: None,
            result: Map::new(),
            error: None,
            retry_count: 0,
            execution_history: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        self.definition.id.as_deref().unwrap_or_default()
    }

    pub fn job_type(&self) -> &str {
        &self.definition.job_type
    }

    pub fn priority(&self) -> JobPriority {
        self.definition.priority
    }

    /// Appends a status transition to the execution history. Safe to call
    /// after the job has reached a terminal status.
    pub fn record_transition(&mut self, status: JobStatus, message: Option<String>) {
        self.execution_history.push(ExecutionRecord {
            status,
            timestamp: Utc::now(),
            message,
        });
    }
}

/// Outcome of a handler's `execute`, matching the collaborator-facing
/// contract: `{success, message?, ...handler-specific}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandlerResult {
    pub success: bool,
    pub message: Option<String>,
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl HandlerResult {
    pub fn ok(data: Map<String, Value>) -> Self {
        Self { success: true, message: None, data }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self { success: false, message: Some(message.into()), data: Map::new() }
    }
}

/// A handler is any entity satisfying `execute(Job) -> Result<HandlerResult>`.
/// Handlers must be idempotent under retry at the granularity of a single
/// `Job` instance: the scheduler never re-invokes the same job.
///
/// The `Result` distinguishes two failure shapes: an `Err` is the handler
/// raising (a missing/invalid parameter, a device communication failure it
/// could not recover from) and propagates to the worker loop as a job
/// failure with the error message; `Ok(HandlerResult { success: false, .. })`
/// is the handler completing normally but reporting a business-level
/// failure it already has a message for.
pub trait TaskHandler: Send + Sync {
    fn execute(&self, job: &Job) -> Result<HandlerResult>;
}

/// Exclusive `job_type -> handler` mapping, written once at startup.
#[derive(Default)]
pub struct TaskHandlerRegistry {
    handlers: Mutex<HashMap<String, Box<dyn TaskHandler>>>,
}

impl TaskHandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, job_type: impl Into<String>, handler: Box<dyn TaskHandler>) -> Result<()> {
        let job_type = job_type.into();
        let mut handlers = self.handlers.lock().unwrap();
        if handlers.contains_key(&job_type) {
            return Err(SchedulerError::HandlerAlreadyRegistered(job_type));
        }
        handlers.insert(job_type, handler);
        Ok(())
    }

    pub fn contains(&self, job_type: &str) -> bool {
        self.handlers.lock().unwrap().contains_key(job_type)
    }

    pub fn execute(&self, job: &Job) -> Option<Result<HandlerResult>> {
        let handlers = self.handlers.lock().unwrap();
        handlers.get(job.job_type()).map(|h| h.execute(job))
    }

    pub fn registered_types(&self) -> Vec<String> {
        self.handlers.lock().unwrap().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_time_definition_without_schedule_time_is_rejected() {
        let mut def = JobDefinition::new("backup", ScheduleType::OneTime);
        assert!(def.validate().is_err());
    }

    #[test]
    fn daily_definition_defaults_hour_and_minute_to_zero() {
        let mut def = JobDefinition::new("backup", ScheduleType::Daily);
        def.validate().unwrap();
        assert_eq!(def.get_i64("hour", -1), 0);
        assert_eq!(def.get_i64("minute", -1), 0);
    }

    #[test]
    fn cron_definition_without_expression_is_rejected() {
        let mut def = JobDefinition::new("backup", ScheduleType::Cron);
        assert!(def.validate().is_err());
    }

    #[test]
    fn registry_rejects_duplicate_registration() {
        struct NoOp;
        impl TaskHandler for NoOp {
            fn execute(&self, _job: &Job) -> Result<HandlerResult> {
                Ok(HandlerResult::ok(Map::new()))
            }
        }
        let registry = TaskHandlerRegistry::new();
        registry.register("backup", Box::new(NoOp)).unwrap();
        let err = registry.register("backup", Box::new(NoOp)).unwrap_err();
        assert!(matches!(err, SchedulerError::HandlerAlreadyRegistered(_)));
    }
}
