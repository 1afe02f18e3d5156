//! Boundary to the external platform scrapers.
//!
//! The engine only sees [`PlatformAdapters`]; production wires in
//! [`ProcessAdapters`], which shells out to the configured scraper commands.

mod process;
mod wire;

use async_trait::async_trait;

pub use process::{AdapterCommand, ProcessAdapters};
pub use wire::{
    decode_forum, decode_posts, decode_videos, summarize_videos, ForumPostSample,
    ForumSnapshot, PostRecord, VideoRecord,
};

use crate::error::AdapterError;

#[async_trait]
pub trait PlatformAdapters: Send + Sync {
    /// Search social posts for `tag` (without leading `#`).
    async fn fetch_posts(&self, tag: &str, limit: usize) -> Result<Vec<PostRecord>, AdapterError>;

    /// Current metadata of one forum. `Ok(None)` means the forum had no data.
    async fn fetch_forum(&self, forum_id: &str) -> Result<Option<ForumSnapshot>, AdapterError>;

    /// Search videos for `tag` (without leading `#`).
    async fn fetch_videos(&self, tag: &str, limit: usize)
        -> Result<Vec<VideoRecord>, AdapterError>;
}
