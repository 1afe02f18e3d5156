use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Process configuration, built once at startup and passed by reference into
/// every component that needs a path, a limit, or an adapter command.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub tracking_path: PathBuf,
    pub data_dir: PathBuf,
    pub queue_path: PathBuf,
    pub results_path: PathBuf,
    pub worker_poll_interval_ms: u64,
    pub worker_max_concurrent_tasks: usize,
    pub task_timeout_secs: Option<u64>,
    pub post_adapter_cmd: String,
    pub forum_adapter_cmd: String,
    pub video_adapter_cmd: String,
    pub post_fetch_limit: usize,
    pub video_fetch_limit: usize,
    pub post_timeout_secs: u64,
    pub forum_timeout_secs: u64,
    pub video_timeout_secs: u64,
}
