use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use super::wire::{decode_forum, decode_posts, decode_videos};
use super::{ForumSnapshot, PlatformAdapters, PostRecord, VideoRecord};
use crate::error::AdapterError;

const STDERR_EXCERPT_CHARS: usize = 500;

/// A scraper command line: program plus leading arguments, and a time limit.
#[derive(Debug, Clone)]
pub struct AdapterCommand {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl AdapterCommand {
    /// Split a configured command line on whitespace.
    #[must_use]
    pub fn parse(line: &str, timeout: Duration) -> Self {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next().unwrap_or_default();
        Self {
            program,
            args: parts.collect(),
            timeout,
        }
    }

    /// Run with `extra` appended and return stdout of a successful exit.
    ///
    /// The child is killed if the time limit elapses.
    async fn run(&self, extra: &[&str]) -> Result<Vec<u8>, AdapterError> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .args(extra)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => {
                return Err(AdapterError::Spawn {
                    program: self.program.clone(),
                    source,
                })
            }
            Err(_) => {
                return Err(AdapterError::Timeout {
                    program: self.program.clone(),
                    timeout: self.timeout,
                })
            }
        };

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            return Err(AdapterError::ExitStatus {
                program: self.program.clone(),
                code: output.status.code(),
                stderr: stderr.trim().chars().take(STDERR_EXCERPT_CHARS).collect(),
            });
        }
        if !stderr.trim().is_empty() {
            tracing::debug!(program = %self.program, stderr = %stderr.trim(), "adapter stderr");
        }
        Ok(output.stdout)
    }
}

/// Adapters backed by external scraper processes.
#[derive(Debug, Clone)]
pub struct ProcessAdapters {
    posts: AdapterCommand,
    forum: AdapterCommand,
    video: AdapterCommand,
}

impl ProcessAdapters {
    #[must_use]
    pub fn new(posts: AdapterCommand, forum: AdapterCommand, video: AdapterCommand) -> Self {
        Self {
            posts,
            forum,
            video,
        }
    }

    #[must_use]
    pub fn from_config(config: &tagpulse_core::AppConfig) -> Self {
        Self::new(
            AdapterCommand::parse(
                &config.post_adapter_cmd,
                Duration::from_secs(config.post_timeout_secs),
            ),
            AdapterCommand::parse(
                &config.forum_adapter_cmd,
                Duration::from_secs(config.forum_timeout_secs),
            ),
            AdapterCommand::parse(
                &config.video_adapter_cmd,
                Duration::from_secs(config.video_timeout_secs),
            ),
        )
    }
}

#[async_trait]
impl PlatformAdapters for ProcessAdapters {
    async fn fetch_posts(&self, tag: &str, limit: usize) -> Result<Vec<PostRecord>, AdapterError> {
        let limit = limit.to_string();
        let stdout = self.posts.run(&[tag, "--limit", &limit]).await?;
        decode_posts(&stdout)
    }

    async fn fetch_forum(&self, forum_id: &str) -> Result<Option<ForumSnapshot>, AdapterError> {
        let stdout = self.forum.run(&[forum_id]).await?;
        decode_forum(&stdout)
    }

    async fn fetch_videos(
        &self,
        tag: &str,
        limit: usize,
    ) -> Result<Vec<VideoRecord>, AdapterError> {
        let limit = limit.to_string();
        let stdout = self.video.run(&[tag, "--limit", &limit]).await?;
        decode_videos(&stdout)
    }
}
