//! In-memory, in-process job scheduler for NetRaven device automation.
//!
//! Jobs are prioritized, queued and dispatched to a fixed worker pool;
//! recurring jobs are tracked in a registry and promoted to the queue by a
//! scheduler-loop thread once due. Task handlers are the extension point:
//! register one per job type before calling [`Scheduler::start`].
//!
//! ```rust,no_run
//! use netraven_scheduler::{Scheduler, JobDefinition, ScheduleType};
//! use shared_config::SchedulerConfig;
//! use std::sync::Arc;
//!
//! let scheduler = Arc::new(Scheduler::new(SchedulerConfig::default()));
//! // scheduler.register_task_handler("backup", Box::new(my_handler))?;
//! scheduler.start(5);
//! let def = JobDefinition::new("backup", ScheduleType::Immediate);
//! // scheduler.schedule_job(def)?;
//! scheduler.stop();
//! ```

pub mod error;
pub mod handlers;
pub mod logging;
pub mod model;
pub mod next_run;
pub mod queue;
pub mod service;

pub use error::{Result, SchedulerError};
pub use handlers::{BackupTaskHandler, CommandExecutionHandler};
pub use logging::{JobLogEntry, JobLoggingService};
pub use model::{
    ExecutionRecord, HandlerResult, Job, JobDefinition, JobPriority, JobStatus, ScheduleType,
    TaskHandler, TaskHandlerRegistry,
};
pub use next_run::calculate_next_run;
pub use queue::{JobQueue, ScheduledRegistry};
pub use service::{Scheduler, ServiceStatus};
