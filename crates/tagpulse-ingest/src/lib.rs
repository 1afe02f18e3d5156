//! Incremental ingestion and analytics for tracked tags.
//!
//! An update run loads the durable dataset from the data directory, asks the
//! platform adapters for fresh observations, admits only posts whose `uri`
//! has never been recorded, merges the per-platform aggregate tables, and
//! recomputes analytics when the post log grew.

pub mod adapters;
pub mod analytics;
pub mod dedup;
pub mod engine;
pub mod error;
pub mod hotness;
pub mod pipeline;
pub mod store;

pub use adapters::{PlatformAdapters, ProcessAdapters};
pub use analytics::recompute;
pub use dedup::DedupSet;
pub use engine::{IngestOutcome, Ingestor};
pub use error::{AdapterError, StoreError};
pub use hotness::{classify, social_peaks, video_views, HotnessTier};
pub use pipeline::{run_update, DataPaths, FetchLimits, UpdateSummary};
