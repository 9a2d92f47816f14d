//! The scheduler's public contract: a fixed-size worker pool pulling jobs
//! off the priority queue, and a scheduler-loop thread moving due recurring
//! jobs from the registry onto that queue.

use crate::error::{Result, SchedulerError};
use crate::logging::JobLoggingService;
use crate::model::{Job, JobDefinition, JobStatus, ScheduleType, TaskHandler, TaskHandlerRegistry};
use crate::next_run::calculate_next_run;
use crate::queue::{JobQueue, ScheduledRegistry};
use chrono::Utc;
use shared_config::SchedulerConfig;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Snapshot returned by [`Scheduler::get_service_status`].
#[derive(Debug, Clone, serde::Serialize)]
pub struct ServiceStatus {
    pub running: bool,
    pub worker_threads: usize,
    pub queue_size: usize,
    pub registry_size: usize,
    pub registered_job_types: Vec<String>,
}

struct Threads {
    workers: Vec<JoinHandle<()>>,
    scheduler: Option<JoinHandle<()>>,
}

/// Job scheduling and execution engine. Constructed explicitly and shared
/// via `Arc` by callers; unlike the service this was modeled on, it is not
/// a process-wide singleton.
pub struct Scheduler {
    queue: Arc<JobQueue>,
    registry: Arc<ScheduledRegistry>,
    handlers: Arc<TaskHandlerRegistry>,
    logging: Arc<JobLoggingService>,
    config: SchedulerConfig,
    shutdown: Arc<AtomicBool>,
    threads: Mutex<Threads>,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            queue: Arc::new(JobQueue::new()),
            registry: Arc::new(ScheduledRegistry::new()),
            handlers: Arc::new(TaskHandlerRegistry::new()),
            logging: Arc::new(JobLoggingService::new()),
            config,
            shutdown: Arc::new(AtomicBool::new(false)),
            threads: Mutex::new(Threads { workers: Vec::new(), scheduler: None }),
        }
    }

    pub fn job_logs(&self, job_id: &str) -> Vec<crate::logging::JobLogEntry> {
        self.logging.get_job_logs(job_id)
    }

    pub fn register_task_handler(&self, job_type: impl Into<String>, handler: Box<dyn TaskHandler>) -> Result<()> {
        let job_type = job_type.into();
        debug!(target: "Scheduler::register_task_handler", job_type = %job_type, "registering task handler");
        self.handlers.register(job_type, handler)
    }

    /// Starts `num_workers` worker threads plus one scheduler-loop thread.
    /// A no-op (with a warning) if already running.
    pub fn start(self: &Arc<Self>, num_workers: usize) {
        let mut threads = self.threads.lock().unwrap();
        if threads.scheduler.is_some() {
            warn!(target: "Scheduler::start", "scheduler is already running");
            return;
        }

        self.shutdown.store(false, Ordering::SeqCst);

        let mut workers = Vec::with_capacity(num_workers);
        for i in 0..num_workers {
            let scheduler = Arc::clone(self);
            workers.push(
                std::thread::Builder::new()
                    .name(format!("scheduler-worker-{i}"))
                    .spawn(move || scheduler.worker_loop())
                    .expect("failed to spawn scheduler worker thread"),
            );
        }

        let scheduler_loop = Arc::clone(self);
        let scheduler_thread = std::thread::Builder::new()
            .name("scheduler-loop".to_string())
            .spawn(move || scheduler_loop.scheduler_loop())
            .expect("failed to spawn scheduler loop thread");

        threads.workers = workers;
        threads.scheduler = Some(scheduler_thread);
        info!(target: "Scheduler::start", num_workers, "scheduler started");
    }

    /// Signals shutdown and joins every worker and the scheduler-loop
    /// thread (each with a bounded wait, matching the reference service).
    pub fn stop(&self) {
        let mut threads = self.threads.lock().unwrap();
        if threads.scheduler.is_none() {
            warn!(target: "Scheduler::stop", "scheduler is not running");
            return;
        }
        self.shutdown.store(true, Ordering::SeqCst);
        self.queue.wake_all();

        for worker in threads.workers.drain(..) {
            let _ = worker.join();
        }
        if let Some(scheduler_thread) = threads.scheduler.take() {
            let _ = scheduler_thread.join();
        }
        info!(target: "Scheduler::stop", "scheduler stopped");
    }

    pub fn is_running(&self) -> bool {
        !self.shutdown.load(Ordering::SeqCst) && self.threads.lock().unwrap().scheduler.is_some()
    }

    /// Schedules `definition` for execution, validating it and requiring a
    /// registered handler for its job type. Immediate jobs go straight onto
    /// the queue; everything else is registered and given a computed
    /// `next_run`.
    pub fn schedule_job(&self, mut definition: JobDefinition) -> Result<Job> {
        if !self.handlers.contains(&definition.job_type) {
            return Err(SchedulerError::NoHandler(definition.job_type.clone()));
        }
        definition.validate()?;
        if definition.id.is_none() {
            definition = definition.with_id(Uuid::new_v4().to_string());
        }

        let mut job = Job::from_definition(definition);
        let job_id = job.id().to_string();

        if job.definition.schedule_type == ScheduleType::Immediate {
            job.next_run = None;
            self.logging.log_job_status(&job_id, JobStatus::Queued, Some("immediate schedule".to_string()));
            self.queue.add_job(job.clone());
        } else {
            if job.next_run.is_none() {
                job.next_run = Some(calculate_next_run(&job, Utc::now())?);
            }
            self.logging.log_job_status(
                &job_id,
                JobStatus::Queued,
                Some(format!("scheduled with {:?} schedule", job.definition.schedule_type)),
            );
            self.registry.register(job.clone());
        }

        debug!(target: "Scheduler::schedule_job", job_id = %job_id, "job scheduled");
        Ok(job)
    }

    /// Queues an additional, immediate execution of a registered job
    /// without disturbing its regular schedule.
    pub fn run_job_now(&self, job_id: &str) -> Result<bool> {
        let Some(mut job) = self.registry.get(job_id) else {
            warn!(target: "Scheduler::run_job_now", job_id, "job not found in registry");
            return Ok(false);
        };

        let immediate_id = format!("{job_id}_immediate_{}", Uuid::new_v4());
        job.definition.id = Some(immediate_id.clone());
        job.created_at = Utc::now();
        job.definition.schedule_type = ScheduleType::Immediate;
        job.next_run = None;
        job.status = JobStatus::Queued;

        self.logging.log_job_status(
            &immediate_id,
            JobStatus::Queued,
            Some(format!("immediate execution of scheduled job {job_id}")),
        );
        self.queue.add_job(job);
        Ok(true)
    }

    /// Cancels a job from either the queue or the registry, whichever has
    /// it. Returns whether anything was actually canceled.
    pub fn cancel_job(&self, job_id: &str) -> bool {
        let queue_result = self.queue.cancel_job(job_id);
        let registry_result = self.registry.unregister(job_id);
        if queue_result || registry_result {
            self.logging.log_job_status(job_id, JobStatus::Canceled, Some("job canceled".to_string()));
        }
        queue_result || registry_result
    }

    pub fn get_job_status(&self, job_id: &str) -> Option<JobStatus> {
        self.queue.get_job_status(job_id).or_else(|| self.registry.get(job_id).map(|j| j.status))
    }

    pub fn get_scheduled_jobs(&self) -> Vec<Job> {
        self.registry.all_jobs()
    }

    pub fn get_queued_jobs(&self) -> Vec<Job> {
        self.queue.queued_jobs()
    }

    pub fn get_service_status(&self) -> ServiceStatus {
        let threads = self.threads.lock().unwrap();
        ServiceStatus {
            running: self.is_running(),
            worker_threads: threads.workers.len(),
            queue_size: self.queue.queue_size(),
            registry_size: self.registry.size(),
            registered_job_types: self.handlers.registered_types(),
        }
    }

    fn worker_loop(&self) {
        debug!(target: "Scheduler::worker_loop", "worker thread started");
        while !self.shutdown.load(Ordering::SeqCst) {
            let Some(mut job) = self.queue.get_job(Some(Duration::from_secs_f64(self.config.queue_poll_interval_seconds))) else {
                continue;
            };
            let job_id = job.id().to_string();
            job.record_transition(JobStatus::Running, Some("job execution started".to_string()));
            self.logging.log_job_start(&job_id);

            match self.handlers.execute(&job) {
                None => {
                    error!(target: "Scheduler::worker_loop", job_id = %job_id, "no handler for job type {}", job.job_type());
                    job.status = JobStatus::Failed;
                    job.error = Some(format!("no handler for job type: {}", job.job_type()));
                    job.record_transition(JobStatus::Failed, job.error.clone());
                    self.logging.log_job_failure(&job_id, job.started_at.unwrap_or(job.created_at), job.error.clone().unwrap_or_default());
                }
                Some(Ok(result)) => {
                    job.completed_at = Some(Utc::now());
                    job.result = result.data.clone();
                    job.status = if result.success { JobStatus::Completed } else { JobStatus::Failed };
                    job.error = result.message.clone();
                    job.record_transition(job.status, result.message.clone());
                    self.logging.log_job_completion(
                        &job_id,
                        job.started_at.unwrap_or(job.created_at),
                        result.success,
                        serde_json::Value::Object(result.data),
                    );
                }
                Some(Err(e)) => {
                    job.status = JobStatus::Failed;
                    job.completed_at = Some(Utc::now());
                    job.error = Some(e.to_string());
                    job.record_transition(JobStatus::Failed, job.error.clone());
                    error!(target: "Scheduler::worker_loop", job_id = %job_id, "job execution failed: {}", e);
                    self.logging.log_job_failure(&job_id, job.started_at.unwrap_or(job.created_at), e.to_string());
                }
            }
        }
        debug!(target: "Scheduler::worker_loop", "worker thread stopped");
    }

    fn scheduler_loop(&self) {
        debug!(target: "Scheduler::scheduler_loop", "scheduler thread started");
        while !self.shutdown.load(Ordering::SeqCst) {
            let now = Utc::now();
            for job in self.registry.due_jobs(now) {
                let job_id = job.id().to_string();
                self.queue.add_job(job.clone());
                if job.definition.schedule_type == ScheduleType::OneTime {
                    self.registry.unregister(&job_id);
                    continue;
                }
                match calculate_next_run(&job, now) {
                    Ok(next_run) => {
                        self.registry.update_next_run(&job_id, next_run);
                    }
                    Err(e) => {
                        warn!(target: "Scheduler::scheduler_loop", job_id = %job_id, "failed to compute next run: {}", e);
                        self.registry.unregister(&job_id);
                    }
                }
            }
            std::thread::sleep(Duration::from_secs_f64(self.config.queue_poll_interval_seconds));
        }
        debug!(target: "Scheduler::scheduler_loop", "scheduler thread stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{HandlerResult, JobPriority};
    use serde_json::{Map, Value};
    use std::sync::atomic::AtomicUsize;

    struct CountingHandler {
        calls: Arc<AtomicUsize>,
    }
    impl TaskHandler for CountingHandler {
        fn execute(&self, _job: &Job) -> Result<HandlerResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(HandlerResult::ok(Map::new()))
        }
    }

    #[test]
    fn schedule_job_rejects_unregistered_job_type() {
        let scheduler = Scheduler::new(SchedulerConfig::default());
        let def = JobDefinition::new("unregistered", ScheduleType::Immediate);
        assert!(matches!(scheduler.schedule_job(def), Err(SchedulerError::NoHandler(_))));
    }

    #[test]
    fn immediate_job_runs_through_registered_handler() {
        let scheduler = Arc::new(Scheduler::new(SchedulerConfig { num_workers: 1, queue_poll_interval_seconds: 0.05 }));
        let calls = Arc::new(AtomicUsize::new(0));
        scheduler
            .register_task_handler("noop", Box::new(CountingHandler { calls: Arc::clone(&calls) }))
            .unwrap();

        scheduler.start(1);
        let def = JobDefinition::new("noop", ScheduleType::Immediate).with_priority(JobPriority::Normal);
        let job = scheduler.schedule_job(def).unwrap();

        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while calls.load(Ordering::SeqCst) == 0 && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
        scheduler.stop();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.get_job_status(job.id()), None);
    }

    #[test]
    fn one_time_job_runs_once_and_is_unregistered() {
        let scheduler = Arc::new(Scheduler::new(SchedulerConfig { num_workers: 1, queue_poll_interval_seconds: 0.05 }));
        let calls = Arc::new(AtomicUsize::new(0));
        scheduler
            .register_task_handler("noop", Box::new(CountingHandler { calls: Arc::clone(&calls) }))
            .unwrap();

        scheduler.start(1);
        let schedule_time = (Utc::now() - chrono::Duration::seconds(1)).to_rfc3339();
        let def = JobDefinition::new("noop", ScheduleType::OneTime)
            .with_id("one-shot")
            .with_parameter("schedule_time", Value::from(schedule_time));
        scheduler.schedule_job(def).unwrap();

        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while calls.load(Ordering::SeqCst) == 0 && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
        // Give the scheduler loop a few more ticks to prove it does not
        // keep re-enqueuing the same ONE_TIME job forever.
        std::thread::sleep(Duration::from_millis(200));
        scheduler.stop();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(scheduler.registry.get("one-shot").is_none());
    }

    #[test]
    fn cancel_job_removes_from_registry() {
        let scheduler = Scheduler::new(SchedulerConfig::default());
        scheduler
            .register_task_handler("noop", Box::new(CountingHandler { calls: Arc::new(AtomicUsize::new(0)) }))
            .unwrap();
        let def = JobDefinition::new("noop", ScheduleType::Daily).with_id("daily-job");
        scheduler.schedule_job(def).unwrap();
        assert!(scheduler.cancel_job("daily-job"));
        assert!(!scheduler.cancel_job("daily-job"));
    }
}
