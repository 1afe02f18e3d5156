//! Shared configuration and domain types for tagpulse.
//!
//! Every other crate in the workspace takes an [`AppConfig`] (built once from
//! the environment) and, where it needs the tag list, a [`TrackingConfig`]
//! loaded from the tracking file. Nothing here holds process-wide state.

pub mod app_config;
pub mod config;
pub mod fs;
pub mod tracking;
pub mod types;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use fs::atomic_write;
pub use tracking::{clean_tag, PlatformKind, TrackedTag, TrackingConfig};
pub use types::{AnalyticsRecord, ForumAggregate, Metric, Post, VideoAggregate};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for env var {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read tracking config {path}: {source}")]
    TrackingFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse tracking config {path}: {reason}")]
    TrackingFileParse { path: String, reason: String },

    #[error("failed to write tracking config {path}: {source}")]
    TrackingFileWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("tracking config validation failed: {0}")]
    Validation(String),

    #[error("tag '{0}' is not configured")]
    UnknownTag(String),
}
