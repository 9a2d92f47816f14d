//! Priority job queue and scheduled-job registry: the two pieces of shared
//! state the scheduler loop, workers and public API all touch concurrently.

use crate::model::{Job, JobStatus};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::sync::{Condvar, Mutex};
use std::time::Duration;
use tracing::debug;

struct QueueEntry {
    priority_value: i64,
    created_at: DateTime<Utc>,
    job_id: String,
    job: Job,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.priority_value == other.priority_value
            && self.created_at == other.created_at
            && self.job_id == other.job_id
    }
}
impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    /// `BinaryHeap` is a max-heap; ordering priority ascending and
    /// created_at descending here makes the heap pop highest-priority,
    /// then oldest (FIFO within a priority tier) first.
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority_value
            .cmp(&other.priority_value)
            .then_with(|| other.created_at.cmp(&self.created_at))
            .then_with(|| other.job_id.cmp(&self.job_id))
    }
}

struct QueueState {
    heap: BinaryHeap<QueueEntry>,
    job_ids: HashSet<String>,
    canceled: HashSet<String>,
}

/// Thread-safe priority queue ordered by `(-priority, created_at, job_id)`:
/// higher priority first, FIFO tiebreak within a priority tier.
pub struct JobQueue {
    state: Mutex<QueueState>,
    condvar: Condvar,
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl JobQueue {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                heap: BinaryHeap::new(),
                job_ids: HashSet::new(),
                canceled: HashSet::new(),
            }),
            condvar: Condvar::new(),
        }
    }

    /// Refuses duplicate or already-canceled job ids.
    pub fn add_job(&self, mut job: Job) {
        let mut state = self.state.lock().unwrap();
        let job_id = job.id().to_string();

        if state.canceled.contains(&job_id) {
            debug!(target: "JobQueue::add_job", "job {} was canceled, not adding", job_id);
            return;
        }
        if state.job_ids.contains(&job_id) {
            debug!(target: "JobQueue::add_job", "job {} is already queued", job_id);
            return;
        }

        job.status = JobStatus::Pending;
        state.job_ids.insert(job_id.clone());
        state.heap.push(QueueEntry {
            priority_value: job.priority().value(),
            created_at: job.created_at,
            job_id,
            job,
        });
        self.condvar.notify_all();
    }

    /// Blocks until a job is available or `timeout` expires (waits
    /// indefinitely when `timeout` is `None`). On wake, skips any popped
    /// entry whose id was tombstoned by a concurrent cancellation.
    pub fn get_job(&self, timeout: Option<Duration>) -> Option<Job> {
        let mut state = self.state.lock().unwrap();
        let deadline = timeout.map(|t| std::time::Instant::now() + t);

        loop {
            while let Some(entry) = state.heap.pop() {
                if state.canceled.remove(&entry.job_id) {
                    debug!(target: "JobQueue::get_job", "skipping canceled job {}", entry.job_id);
                    state.job_ids.remove(&entry.job_id);
                    continue;
                }
                let mut job = entry.job;
                job.status = JobStatus::Running;
                job.started_at = Some(Utc::now());
                state.job_ids.remove(&entry.job_id);
                return Some(job);
            }

            match deadline {
                None => {
                    state = self.condvar.wait(state).unwrap();
                }
                Some(deadline) => {
                    let now = std::time::Instant::now();
                    if now >= deadline {
                        return None;
                    }
                    let (guard, result) = self
                        .condvar
                        .wait_timeout(state, deadline - now)
                        .unwrap();
                    state = guard;
                    if result.timed_out() && state.heap.is_empty() {
                        return None;
                    }
                }
            }
        }
    }

    /// Removes a queued job immediately (status flips to CANCELED); for a
    /// job not currently queued, records a tombstone so a late scheduler
    /// add (or an in-flight dequeue race) is still intercepted.
    pub fn cancel_job(&self, job_id: &str) -> bool {
        let mut state = self.state.lock().unwrap();
        if state.job_ids.remove(job_id) {
            state.canceled.insert(job_id.to_string());
            let remaining: Vec<QueueEntry> = state
                .heap
                .drain()
                .filter(|e| e.job_id != job_id)
                .collect();
            state.heap = BinaryHeap::from(remaining);
            debug!(target: "JobQueue::cancel_job", "canceled queued job {}", job_id);
            true
        } else {
            state.canceled.insert(job_id.to_string());
            debug!(target: "JobQueue::cancel_job", "marked {} canceled for future processing", job_id);
            false
        }
    }

    pub fn get_job_status(&self, job_id: &str) -> Option<JobStatus> {
        let state = self.state.lock().unwrap();
        if state.job_ids.contains(job_id) {
            return Some(JobStatus::Pending);
        }
        if state.canceled.contains(job_id) {
            return Some(JobStatus::Canceled);
        }
        None
    }

    pub fn queued_jobs(&self) -> Vec<Job> {
        let state = self.state.lock().unwrap();
        let mut jobs: Vec<Job> = state.heap.iter().map(|e| e.job.clone()).collect();
        jobs.sort_by(|a, b| {
            b.priority()
                .value()
                .cmp(&a.priority().value())
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        jobs
    }

    pub fn queue_size(&self) -> usize {
        self.state.lock().unwrap().job_ids.len()
    }

    /// Wakes every thread blocked in `get_job` so they can observe a
    /// shutdown signal rather than waiting out their full timeout.
    pub fn wake_all(&self) {
        self.condvar.notify_all();
    }
}

/// Map of `job_id -> (Job, next_run)` for every non-immediate definition.
#[derive(Default)]
pub struct ScheduledRegistry {
    jobs: Mutex<HashMap<String, Job>>,
}

impl ScheduledRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, job: Job) {
        let mut jobs = self.jobs.lock().unwrap();
        jobs.insert(job.id().to_string(), job);
    }

    pub fn unregister(&self, job_id: &str) -> bool {
        self.jobs.lock().unwrap().remove(job_id).is_some()
    }

    pub fn update_next_run(&self, job_id: &str, next_run: DateTime<Utc>) -> bool {
        let mut jobs = self.jobs.lock().unwrap();
        if let Some(job) = jobs.get_mut(job_id) {
            job.next_run = Some(next_run);
            true
        } else {
            false
        }
    }

    pub fn get(&self, job_id: &str) -> Option<Job> {
        self.jobs.lock().unwrap().get(job_id).cloned()
    }

    pub fn due_jobs(&self, now: DateTime<Utc>) -> Vec<Job> {
        self.jobs
            .lock()
            .unwrap()
            .values()
            .filter(|j| j.next_run.map(|nr| nr <= now).unwrap_or(false))
            .cloned()
            .collect()
    }

    pub fn all_jobs(&self) -> Vec<Job> {
        self.jobs.lock().unwrap().values().cloned().collect()
    }

    pub fn size(&self) -> usize {
        self.jobs.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{JobDefinition, JobPriority, ScheduleType};

    fn job(id: &str, priority: JobPriority) -> Job {
        let def = JobDefinition::new("noop", ScheduleType::Immediate)
            .with_id(id)
            .with_priority(priority);
        Job::from_definition(def)
    }

    #[test]
    fn higher_priority_dequeues_before_lower_priority() {
        let q = JobQueue::new();
        q.add_job(job("low", JobPriority::Low));
        q.add_job(job("critical", JobPriority::Critical));
        let first = q.get_job(Some(Duration::from_millis(10))).unwrap();
        assert_eq!(first.id(), "critical");
    }

    #[test]
    fn same_priority_dequeues_fifo() {
        let q = JobQueue::new();
        q.add_job(job("first", JobPriority::Normal));
        std::thread::sleep(Duration::from_millis(2));
        q.add_job(job("second", JobPriority::Normal));
        let a = q.get_job(Some(Duration::from_millis(10))).unwrap();
        let b = q.get_job(Some(Duration::from_millis(10))).unwrap();
        assert_eq!(a.id(), "first");
        assert_eq!(b.id(), "second");
    }

    #[test]
    fn cancel_while_queued_prevents_dequeue() {
        let q = JobQueue::new();
        q.add_job(job("to-cancel", JobPriority::Normal));
        assert!(q.cancel_job("to-cancel"));
        let result = q.get_job(Some(Duration::from_millis(20)));
        assert!(result.is_none());
    }

    #[test]
    fn get_job_times_out_on_empty_queue() {
        let q = JobQueue::new();
        let result = q.get_job(Some(Duration::from_millis(20)));
        assert!(result.is_none());
    }

    #[test]
    fn duplicate_add_is_ignored() {
        let q = JobQueue::new();
        q.add_job(job("dup", JobPriority::Normal));
        q.add_job(job("dup", JobPriority::Critical));
        assert_eq!(q.queue_size(), 1);
    }
}
