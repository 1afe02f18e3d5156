//! Polling worker that drains the queue into bounded concurrent executions.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};

use crate::error::QueueError;
use crate::executor::TaskExecutor;
use crate::queue::{Dequeued, TaskQueue};
use crate::results::ResultLog;
use crate::task::Task;

const MAX_SLOTS: usize = 1024;

/// What a single poll cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Nothing to dispatch: no queue, corrupt queue, or drained queue.
    Idle,
    /// Every execution slot is busy; the queue was left untouched.
    Saturated,
    /// A previous cycle is still running.
    Overlapping,
    /// The task with this id was dequeued and handed to an execution slot.
    Dispatched(String),
}

/// Pulls tasks off the queue and runs them in the background.
///
/// A slot is reserved before anything is dequeued, so tasks only leave the
/// queue when they can start immediately.
pub struct Worker {
    queue: TaskQueue,
    results: ResultLog,
    executor: TaskExecutor,
    slots: Arc<Semaphore>,
    slot_count: u32,
    cycle: Mutex<()>,
}

impl Worker {
    /// Create a worker that runs at most `max_concurrent` tasks at once.
    ///
    /// `max_concurrent` is clamped to `1..=1024`.
    #[must_use]
    pub fn new(
        queue: TaskQueue,
        results: ResultLog,
        executor: TaskExecutor,
        max_concurrent: usize,
    ) -> Self {
        let slots = max_concurrent.clamp(1, MAX_SLOTS);
        Self {
            queue,
            results,
            executor,
            slots: Arc::new(Semaphore::new(slots)),
            slot_count: u32::try_from(slots).unwrap_or(1),
            cycle: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn from_config(config: &tagpulse_core::AppConfig) -> Self {
        Self::new(
            TaskQueue::new(&config.queue_path),
            ResultLog::new(&config.results_path),
            TaskExecutor::new(config.task_timeout_secs.map(Duration::from_secs)),
            config.worker_max_concurrent_tasks,
        )
    }

    #[must_use]
    pub fn queue(&self) -> &TaskQueue {
        &self.queue
    }

    /// Run one poll cycle.
    ///
    /// Entries without a command are dropped and the cycle moves on to the
    /// next entry. At most one task is dispatched per cycle.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError`] if the queue file cannot be locked, read, or
    /// rewritten.
    pub async fn poll_once(&self) -> Result<PollOutcome, QueueError> {
        let Ok(_cycle) = self.cycle.try_lock() else {
            return Ok(PollOutcome::Overlapping);
        };
        let Ok(permit) = Arc::clone(&self.slots).try_acquire_owned() else {
            tracing::debug!("all execution slots busy; leaving queue untouched");
            return Ok(PollOutcome::Saturated);
        };

        loop {
            let queue = self.queue.clone();
            match tokio::task::spawn_blocking(move || queue.dequeue()).await?? {
                Dequeued::Absent | Dequeued::Drained => return Ok(PollOutcome::Idle),
                Dequeued::Corrupt => {
                    tracing::warn!(
                        path = %self.queue.path().display(),
                        "discarded corrupt queue file"
                    );
                    return Ok(PollOutcome::Idle);
                }
                Dequeued::Entry(entry) => match entry.into_task() {
                    Ok(task) => {
                        let task_id = task.task_id.clone();
                        self.dispatch(task, permit);
                        return Ok(PollOutcome::Dispatched(task_id));
                    }
                    Err(task_id) => {
                        tracing::warn!(task_id, "dropping queue entry without a command");
                    }
                },
            }
        }
    }

    fn dispatch(&self, task: Task, permit: OwnedSemaphorePermit) {
        let executor = self.executor.clone();
        let results = self.results.clone();
        tracing::info!(task_id = %task.task_id, command = %task.command, "task started");

        tokio::spawn(async move {
            let result = executor.execute(&task).await;
            tracing::info!(
                task_id = %result.task_id,
                status = %result.status,
                exit_code = ?result.exit_code,
                "task finished"
            );
            match tokio::task::spawn_blocking(move || results.append(&result)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::error!(task_id = %task.task_id, error = %e, "failed to record task result");
                }
                Err(e) => {
                    tracing::error!(task_id = %task.task_id, error = %e, "result writer panicked");
                }
            }
            drop(permit);
        });
    }

    /// Wait until every in-flight task has finished and recorded its result.
    pub async fn wait_idle(&self) {
        if let Ok(all) = self.slots.acquire_many(self.slot_count).await {
            drop(all);
        }
    }
}
