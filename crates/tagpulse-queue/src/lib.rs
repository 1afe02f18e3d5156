//! Durable file-backed task queue shared by the tagpulse producer and worker.
//!
//! The producer ([`TaskQueue::enqueue`]) and the worker ([`Worker`]) are
//! separate processes. The queue file and the result log are their only
//! channel; every read-modify-write of either file happens under an exclusive
//! lock on a sidecar `.lock` file and ends in an atomic rename.

pub mod error;
pub mod executor;
pub mod queue;
pub mod results;
pub mod task;
pub mod worker;

mod file;

pub use error::QueueError;
pub use executor::TaskExecutor;
pub use queue::{Dequeued, TaskQueue};
pub use results::ResultLog;
pub use task::{new_task_id, QueueEntry, Task, TaskResult, TaskStatus};
pub use worker::{PollOutcome, Worker};
