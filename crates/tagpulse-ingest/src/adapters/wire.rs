//! JSON shapes printed by the scraper processes, and their conversion into
//! stored rows. Counts may be `null`; a `null` count is read as zero.

use serde::Deserialize;
use tagpulse_core::{ForumAggregate, Post, VideoAggregate};

use crate::error::AdapterError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PostRecord {
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub likes: Option<u64>,
    #[serde(default)]
    pub reposts: Option<u64>,
    #[serde(default)]
    pub replies: Option<u64>,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl PostRecord {
    /// Convert into a stored [`Post`] under the tracked tag.
    ///
    /// Returns `None` for records without a `uri`, which cannot be
    /// deduplicated.
    #[must_use]
    pub fn into_post(self, tag: &str) -> Option<Post> {
        let uri = self.uri.filter(|u| !u.trim().is_empty())?;
        Some(Post {
            tag: tag.to_string(),
            author: self.author.unwrap_or_default(),
            text: self.text.unwrap_or_default(),
            likes: self.likes.unwrap_or(0),
            reposts: self.reposts.unwrap_or(0),
            replies: self.replies.unwrap_or(0),
            uri,
            created_at: self.created_at.filter(|c| !c.is_empty()),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ForumPostSample {
    #[serde(default)]
    pub score: Option<i64>,
    #[serde(default)]
    pub num_comments: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ForumSnapshot {
    #[serde(default)]
    pub subreddit: Option<String>,
    #[serde(default)]
    pub subscribers: Option<u64>,
    #[serde(default)]
    pub active_user_count: Option<u64>,
    #[serde(default)]
    pub posts: Vec<ForumPostSample>,
}

impl ForumSnapshot {
    /// Collapse the snapshot into the tag's forum row. Averages are zero when
    /// no posts were sampled.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn into_aggregate(self, tag: &str, forum_id: &str) -> ForumAggregate {
        let sampled = self.posts.len();
        let (avg_score, avg_comments) = if sampled == 0 {
            (0.0, 0.0)
        } else {
            let score: i64 = self.posts.iter().map(|p| p.score.unwrap_or(0)).sum();
            let comments: u64 = self.posts.iter().map(|p| p.num_comments.unwrap_or(0)).sum();
            (
                score as f64 / sampled as f64,
                comments as f64 / sampled as f64,
            )
        };
        ForumAggregate {
            tag: tag.to_string(),
            forum_id: self
                .subreddit
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| forum_id.to_string()),
            subscriber_count: self.subscribers.unwrap_or(0),
            active_user_count: self.active_user_count,
            sampled_post_count: sampled as u64,
            avg_score,
            avg_comments,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct VideoRecord {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub view_count: Option<u64>,
    #[serde(default)]
    pub like_count: Option<u64>,
    #[serde(default)]
    pub comment_count: Option<u64>,
}

/// Sum a tag's video search results into one row. The top video is the most
/// viewed one; the first wins on ties.
#[must_use]
pub fn summarize_videos(tag: &str, videos: &[VideoRecord]) -> VideoAggregate {
    let top_video_url = videos
        .iter()
        .enumerate()
        .max_by_key(|(i, v)| (v.view_count.unwrap_or(0), std::cmp::Reverse(*i)))
        .and_then(|(_, v)| v.url.clone());

    VideoAggregate {
        tag: tag.to_string(),
        total_views: total(videos, |v| v.view_count),
        total_likes: total(videos, |v| v.like_count),
        total_comments: total(videos, |v| v.comment_count),
        top_video_url,
    }
}

fn total(videos: &[VideoRecord], count: impl Fn(&VideoRecord) -> Option<u64>) -> u64 {
    videos
        .iter()
        .fold(0u64, |acc, v| acc.saturating_add(count(v).unwrap_or(0)))
}

fn is_blank(stdout: &[u8]) -> bool {
    stdout.iter().all(u8::is_ascii_whitespace)
}

fn decode_err(context: &str, source: serde_json::Error) -> AdapterError {
    AdapterError::Decode {
        context: context.to_string(),
        source,
    }
}

/// # Errors
///
/// Returns [`AdapterError::Decode`] if stdout is not a JSON array of posts.
pub fn decode_posts(stdout: &[u8]) -> Result<Vec<PostRecord>, AdapterError> {
    if is_blank(stdout) {
        return Ok(Vec::new());
    }
    serde_json::from_slice(stdout).map_err(|e| decode_err("post adapter", e))
}

/// `[]` and blank output both mean the forum returned no data.
///
/// # Errors
///
/// Returns [`AdapterError::Decode`] if stdout is neither of those nor a forum
/// object.
pub fn decode_forum(stdout: &[u8]) -> Result<Option<ForumSnapshot>, AdapterError> {
    if is_blank(stdout) {
        return Ok(None);
    }
    let value: serde_json::Value =
        serde_json::from_slice(stdout).map_err(|e| decode_err("forum adapter", e))?;
    match &value {
        serde_json::Value::Array(items) if items.is_empty() => return Ok(None),
        serde_json::Value::Object(_) => {}
        _ => {
            return Err(decode_err(
                "forum adapter",
                serde::de::Error::custom("expected a JSON object or []"),
            ))
        }
    }
    serde_json::from_value(value)
        .map(Some)
        .map_err(|e| decode_err("forum adapter", e))
}

/// # Errors
///
/// Returns [`AdapterError::Decode`] if stdout is not a JSON array of videos.
pub fn decode_videos(stdout: &[u8]) -> Result<Vec<VideoRecord>, AdapterError> {
    if is_blank(stdout) {
        return Ok(Vec::new());
    }
    serde_json::from_slice(stdout).map_err(|e| decode_err("video adapter", e))
}
