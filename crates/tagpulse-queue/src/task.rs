use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

fn unknown_task_id() -> String {
    "unknown".to_string()
}

/// One element of the queue file as it exists on disk.
///
/// Entries written by other tools may lack either field; a missing id reads
/// as `"unknown"` and a missing command makes the entry undispatchable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    #[serde(default = "unknown_task_id")]
    pub task_id: String,
    #[serde(default)]
    pub command: Option<String>,
}

impl QueueEntry {
    #[must_use]
    pub fn new(task_id: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            command: Some(command.into()),
        }
    }

    /// Convert into a dispatchable [`Task`].
    ///
    /// # Errors
    ///
    /// Returns the entry's `task_id` when the command is missing or blank.
    pub fn into_task(self) -> Result<Task, String> {
        match self.command {
            Some(command) if !command.trim().is_empty() => Ok(Task {
                task_id: self.task_id,
                command,
            }),
            _ => Err(self.task_id),
        }
    }
}

/// A queue entry that carries a shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub task_id: String,
    pub command: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Running,
    Completed,
    Failed,
    Error,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// Outcome of one task execution, as appended to the result log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResult {
    pub task_id: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub stdout: String,
    #[serde(default)]
    pub stderr: String,
    #[serde(default)]
    pub exit_code: Option<i32>,
    pub timestamp: DateTime<Utc>,
}

/// Fresh globally unique task id.
#[must_use]
pub fn new_task_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
