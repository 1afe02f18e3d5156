//! One full update run over the durable dataset.

use std::path::{Path, PathBuf};

use tagpulse_core::{Post, TrackedTag};

use crate::adapters::PlatformAdapters;
use crate::analytics::recompute;
use crate::dedup::DedupSet;
use crate::engine::Ingestor;
use crate::error::StoreError;
use crate::store::{AnalyticsFile, ForumTable, PostLog, VideoTable};

/// Locations of the dataset files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub posts: PathBuf,
    pub forum: PathBuf,
    pub video: PathBuf,
    pub analytics: PathBuf,
    pub links: PathBuf,
}

impl DataPaths {
    /// Standard file names inside `dir`.
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            posts: dir.join("posts.csv"),
            forum: dir.join("forum_aggregates.csv"),
            video: dir.join("video_aggregates.csv"),
            analytics: dir.join("analytics.csv"),
            links: dir.join("hashtag_links.csv"),
        }
    }
}

/// Counters reported after an update run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateSummary {
    pub tags: usize,
    pub new_posts: usize,
    pub forum_refreshed: usize,
    pub videos_added: usize,
    pub adapter_failures: usize,
    pub config_warnings: usize,
    pub analytics_rewritten: bool,
    pub analytics_records: usize,
}

/// Limits applied to adapter queries.
#[derive(Debug, Clone, Copy)]
pub struct FetchLimits {
    pub posts: usize,
    pub videos: usize,
}

impl FetchLimits {
    #[must_use]
    pub fn from_config(config: &tagpulse_core::AppConfig) -> Self {
        Self {
            posts: config.post_fetch_limit,
            videos: config.video_fetch_limit,
        }
    }
}

struct Dataset {
    posts: Vec<Post>,
    forum: ForumTable,
    video: VideoTable,
}

impl Dataset {
    fn load(paths: &DataPaths) -> Result<Self, StoreError> {
        Ok(Self {
            posts: PostLog::new(&paths.posts).load()?,
            forum: ForumTable::load(&paths.forum)?,
            video: VideoTable::load(&paths.video)?,
        })
    }
}

async fn blocking<T, F>(work: F) -> Result<T, StoreError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
{
    tokio::task::spawn_blocking(work).await?
}

/// Run one incremental update for `tags`.
///
/// Loads the post log and aggregate tables, ingests from the adapters,
/// appends new posts, rewrites the aggregate tables that changed, and
/// replaces the analytics file only when new posts arrived.
///
/// # Errors
///
/// Returns [`StoreError`] if the dataset cannot be read or written. Adapter
/// failures are not errors; they are counted in the summary.
pub async fn run_update<A: PlatformAdapters>(
    adapters: &A,
    tags: &[TrackedTag],
    paths: &DataPaths,
    limits: FetchLimits,
) -> Result<UpdateSummary, StoreError> {
    let load_paths = paths.clone();
    let Dataset {
        mut posts,
        mut forum,
        mut video,
    } = blocking(move || Dataset::load(&load_paths)).await?;

    let mut seen = DedupSet::from_posts(&posts);
    tracing::info!(
        tags = tags.len(),
        known_posts = seen.len(),
        "update run starting"
    );

    let outcome = Ingestor::new(adapters, limits.posts, limits.videos)
        .ingest(tags, &mut seen, &mut forum, &mut video)
        .await;

    let mut summary = UpdateSummary {
        tags: tags.len(),
        new_posts: outcome.new_posts.len(),
        forum_refreshed: outcome.forum_refreshed,
        videos_added: outcome.videos_added,
        adapter_failures: outcome.adapter_failures,
        config_warnings: outcome.config_warnings,
        ..UpdateSummary::default()
    };

    let persist_paths = paths.clone();
    let analytics = blocking(move || {
        PostLog::new(&persist_paths.posts).append(&outcome.new_posts)?;
        if outcome.forum_refreshed > 0 {
            forum.save()?;
        }
        if outcome.videos_added > 0 {
            video.save()?;
        }
        if !outcome.touched_any {
            return Ok(None);
        }
        posts.extend(outcome.new_posts);
        let records = recompute(&posts);
        AnalyticsFile::new(&persist_paths.analytics).replace(&records)?;
        Ok(Some(records.len()))
    })
    .await?;

    if let Some(count) = analytics {
        summary.analytics_rewritten = true;
        summary.analytics_records = count;
    }

    tracing::info!(
        new_posts = summary.new_posts,
        forum_refreshed = summary.forum_refreshed,
        videos_added = summary.videos_added,
        adapter_failures = summary.adapter_failures,
        analytics_rewritten = summary.analytics_rewritten,
        "update run complete"
    );
    Ok(summary)
}
