//! Queue worker: a repeated scheduler job drives the poll cycle.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tagpulse_core::AppConfig;
use tagpulse_queue::{PollOutcome, Worker};
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Run the worker until Ctrl-C or SIGTERM, then wait for in-flight tasks.
///
/// # Errors
///
/// Returns an error if the scheduler cannot be started or stopped.
pub(crate) async fn run_worker(config: &AppConfig) -> anyhow::Result<()> {
    let worker = Arc::new(Worker::from_config(config));
    let interval = Duration::from_millis(config.worker_poll_interval_ms);

    let mut scheduler = build_scheduler(Arc::clone(&worker), interval)
        .await
        .context("failed to start worker scheduler")?;
    tracing::info!(
        queue = %config.queue_path.display(),
        results = %config.results_path.display(),
        poll_interval_ms = config.worker_poll_interval_ms,
        max_concurrent_tasks = config.worker_max_concurrent_tasks,
        "worker started"
    );

    crate::shutdown_signal().await;

    scheduler
        .shutdown()
        .await
        .context("failed to stop worker scheduler")?;
    tracing::info!("waiting for in-flight tasks");
    worker.wait_idle().await;
    tracing::info!("worker stopped");
    Ok(())
}

/// Scheduler repeats are whole seconds; round up, never below one second.
fn whole_seconds(interval: Duration) -> Duration {
    let secs = interval.as_secs() + u64::from(interval.subsec_nanos() > 0);
    Duration::from_secs(secs.max(1))
}

/// Build and start a scheduler that polls the queue every `interval`.
///
/// The returned [`JobScheduler`] must be kept alive; dropping it stops
/// polling.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised, the
/// job cannot be registered, or the scheduler fails to start.
pub(crate) async fn build_scheduler(
    worker: Arc<Worker>,
    interval: Duration,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    let every = whole_seconds(interval);
    if every != interval {
        tracing::warn!(
            requested = ?interval,
            effective = ?every,
            "poll interval rounded up to whole seconds"
        );
    }

    let job = Job::new_repeated_async(every, move |_uuid, _lock| {
        let worker = Arc::clone(&worker);
        Box::pin(async move {
            match worker.poll_once().await {
                Ok(PollOutcome::Dispatched(task_id)) => {
                    tracing::debug!(task_id, "poll cycle dispatched a task");
                }
                Ok(PollOutcome::Overlapping) => {
                    tracing::debug!("previous poll cycle still running; tick skipped");
                }
                Ok(PollOutcome::Idle | PollOutcome::Saturated) => {}
                Err(e) => tracing::error!(error = %e, "poll cycle failed"),
            }
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;
    Ok(scheduler)
}
