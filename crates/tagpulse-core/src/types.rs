use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One social post as stored in the append-only post log.
///
/// `uri` is the deduplication key. `created_at` is kept exactly as the adapter
/// reported it so that unparseable timestamps survive a round-trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    #[serde(rename = "hashtag")]
    pub tag: String,
    pub author: String,
    pub text: String,
    pub likes: u64,
    pub reposts: u64,
    pub replies: u64,
    pub uri: String,
    pub created_at: Option<String>,
}

impl Post {
    /// Likes, reposts, and replies summed (saturating).
    #[must_use]
    pub fn engagement(&self) -> u64 {
        self.likes
            .saturating_add(self.reposts)
            .saturating_add(self.replies)
    }
}

/// Live snapshot of a tag's forum, replaced wholesale on every refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForumAggregate {
    #[serde(rename = "hashtag")]
    pub tag: String,
    #[serde(rename = "subreddit")]
    pub forum_id: String,
    #[serde(rename = "subscribers")]
    pub subscriber_count: u64,
    pub active_user_count: Option<u64>,
    #[serde(rename = "sampled_posts")]
    pub sampled_post_count: u64,
    pub avg_score: f64,
    pub avg_comments: f64,
}

/// Video totals for a tag. Computed once per tag and never refreshed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoAggregate {
    #[serde(rename = "hashtag")]
    pub tag: String,
    pub total_views: u64,
    pub total_likes: u64,
    pub total_comments: u64,
    pub top_video_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    DailyPosts,
    TopPosterActivity,
    TopPosterEngagement,
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Metric::DailyPosts => write!(f, "daily_posts"),
            Metric::TopPosterActivity => write!(f, "top_poster_activity"),
            Metric::TopPosterEngagement => write!(f, "top_poster_engagement"),
        }
    }
}

/// One derived metric row. `date` is set for `daily_posts`, `author` for the
/// two leaderboard metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsRecord {
    pub metric: Metric,
    #[serde(rename = "hashtag")]
    pub tag: String,
    pub date: Option<NaiveDate>,
    pub author: Option<String>,
    pub value: u64,
}
