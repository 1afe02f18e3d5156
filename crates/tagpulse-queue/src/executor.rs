use std::process::Stdio;
use std::time::Duration;

use chrono::Utc;
use tokio::process::Command;

use crate::task::{Task, TaskResult, TaskStatus};

#[cfg(windows)]
const DEFAULT_SHELL: (&str, &str) = ("cmd", "/C");
#[cfg(not(windows))]
const DEFAULT_SHELL: (&str, &str) = ("sh", "-c");

/// Runs task commands through the platform shell.
#[derive(Debug, Clone)]
pub struct TaskExecutor {
    shell: String,
    shell_flag: String,
    timeout: Option<Duration>,
}

impl Default for TaskExecutor {
    fn default() -> Self {
        Self {
            shell: DEFAULT_SHELL.0.to_string(),
            shell_flag: DEFAULT_SHELL.1.to_string(),
            timeout: None,
        }
    }
}

impl TaskExecutor {
    #[must_use]
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }

    /// Replace the shell program used to interpret commands.
    #[must_use]
    pub fn with_shell(mut self, shell: impl Into<String>, flag: impl Into<String>) -> Self {
        self.shell = shell.into();
        self.shell_flag = flag.into();
        self
    }

    /// Run one task to completion and describe the outcome.
    ///
    /// Never fails: a process that cannot be started is reported as
    /// [`TaskStatus::Error`], and a timeout kills the child and reports
    /// [`TaskStatus::Failed`] with no exit code.
    pub async fn execute(&self, task: &Task) -> TaskResult {
        let mut command = Command::new(&self.shell);
        command
            .arg(&self.shell_flag)
            .arg(&task.command)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let run = command.output();
        let outcome = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, run).await {
                Ok(output) => output.map(Some),
                Err(_) => Ok(None),
            },
            None => run.await.map(Some),
        };

        let (status, stdout, stderr, exit_code) = match outcome {
            Ok(Some(output)) => {
                let status = if output.status.success() {
                    TaskStatus::Completed
                } else {
                    TaskStatus::Failed
                };
                (
                    status,
                    String::from_utf8_lossy(&output.stdout).into_owned(),
                    String::from_utf8_lossy(&output.stderr).into_owned(),
                    output.status.code(),
                )
            }
            Ok(None) => (
                TaskStatus::Failed,
                String::new(),
                format!(
                    "task timed out after {:?}",
                    self.timeout.unwrap_or_default()
                ),
                None,
            ),
            Err(e) => (
                TaskStatus::Error,
                String::new(),
                format!("failed to start '{}': {e}", self.shell),
                None,
            ),
        };

        TaskResult {
            task_id: task.task_id.clone(),
            status,
            stdout,
            stderr,
            exit_code,
            timestamp: Utc::now(),
        }
    }
}
