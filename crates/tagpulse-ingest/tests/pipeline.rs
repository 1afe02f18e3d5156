//! End-to-end update runs against scripted in-memory adapters and a temporary
//! data directory.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;
use tagpulse_core::{Metric, TrackedTag, TrackingConfig};
use tagpulse_ingest::adapters::{ForumSnapshot, PostRecord, VideoRecord};
use tagpulse_ingest::store::{AnalyticsFile, ForumTable, PostLog, VideoTable};
use tagpulse_ingest::{
    classify, run_update, social_peaks, AdapterError, DataPaths, DedupSet, FetchLimits,
    HotnessTier, PlatformAdapters,
};

const LIMITS: FetchLimits = FetchLimits {
    posts: 100,
    videos: 5,
};

/// Adapters whose responses can be changed between runs.
#[derive(Default)]
struct ScriptedAdapters {
    posts: Mutex<HashMap<String, Vec<PostRecord>>>,
    broken_posts: Mutex<Vec<String>>,
    subscribers: Mutex<u64>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedAdapters {
    fn set_posts(&self, tag: &str, posts: &[(&str, &str, &str)]) {
        let records = posts
            .iter()
            .map(|(uri, author, created_at)| PostRecord {
                author: Some((*author).to_string()),
                text: Some(format!("post {uri}")),
                likes: Some(1),
                reposts: None,
                replies: Some(0),
                uri: Some((*uri).to_string()),
                created_at: Some((*created_at).to_string()),
            })
            .collect();
        self.posts.lock().unwrap().insert(tag.to_string(), records);
    }

    fn break_posts(&self, tag: &str) {
        self.broken_posts.lock().unwrap().push(tag.to_string());
    }

    fn calls_of(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }
}

#[async_trait]
impl PlatformAdapters for ScriptedAdapters {
    async fn fetch_posts(&self, tag: &str, _limit: usize) -> Result<Vec<PostRecord>, AdapterError> {
        self.calls.lock().unwrap().push(format!("posts:{tag}"));
        if self.broken_posts.lock().unwrap().iter().any(|t| t == tag) {
            return Err(AdapterError::ExitStatus {
                program: "scripted".to_string(),
                code: Some(1),
                stderr: "rate limited".to_string(),
            });
        }
        Ok(self.posts.lock().unwrap().get(tag).cloned().unwrap_or_default())
    }

    async fn fetch_forum(&self, forum_id: &str) -> Result<Option<ForumSnapshot>, AdapterError> {
        self.calls.lock().unwrap().push(format!("forum:{forum_id}"));
        Ok(Some(ForumSnapshot {
            subreddit: Some(forum_id.to_string()),
            subscribers: Some(*self.subscribers.lock().unwrap()),
            ..ForumSnapshot::default()
        }))
    }

    async fn fetch_videos(&self, tag: &str, _limit: usize) -> Result<Vec<VideoRecord>, AdapterError> {
        self.calls.lock().unwrap().push(format!("video:{tag}"));
        Ok(vec![VideoRecord {
            url: Some(format!("https://video.example/{tag}")),
            view_count: Some(1_000),
            like_count: Some(10),
            comment_count: None,
        }])
    }
}

fn tracked(tags: &[&str], templates: serde_json::Value) -> Vec<TrackedTag> {
    let tracking: TrackingConfig = serde_json::from_value(json!({
        "hashtags": tags,
        "platform_url_templates": templates,
    }))
    .unwrap();
    tracking.tracked_tags()
}

fn social_only(tags: &[&str]) -> Vec<TrackedTag> {
    tracked(tags, json!({ "bluesky": "https://bsky.app/search?q=%23{}" }))
}

fn all_platforms(tags: &[&str]) -> Vec<TrackedTag> {
    tracked(
        tags,
        json!({
            "bluesky": "https://bsky.app/search?q=%23{}",
            "reddit": "https://www.reddit.com/r/{}/",
            "youtube": "https://www.youtube.com/results?search_query=%23{}",
        }),
    )
}

#[tokio::test]
async fn foo_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let paths = DataPaths::in_dir(dir.path());
    let adapters = ScriptedAdapters::default();
    adapters.set_posts(
        "Foo",
        &[
            ("u1", "alice", "2024-01-01T08:00:00Z"),
            ("u2", "bob", "2024-01-01T20:00:00Z"),
        ],
    );

    let summary = run_update(&adapters, &social_only(&["Foo"]), &paths, LIMITS)
        .await
        .unwrap();

    assert_eq!(summary.new_posts, 2);
    assert!(summary.analytics_rewritten);

    let posts = PostLog::new(&paths.posts).load().unwrap();
    assert_eq!(posts.len(), 2);
    assert!(posts.iter().all(|p| p.tag == "Foo"));

    let daily: Vec<_> = AnalyticsFile::new(&paths.analytics)
        .load()
        .unwrap()
        .into_iter()
        .filter(|r| r.metric == Metric::DailyPosts)
        .collect();
    assert_eq!(daily.len(), 1);
    assert_eq!(daily[0].value, 2);

    let seen = DedupSet::from_posts(&posts);
    assert!(seen.contains("u1") && seen.contains("u2"));

    // Social-only config never touches the forum or video tables.
    assert!(!paths.forum.exists());
    assert!(!paths.video.exists());
}

#[tokio::test]
async fn rerun_with_same_data_changes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let paths = DataPaths::in_dir(dir.path());
    let adapters = ScriptedAdapters::default();
    adapters.set_posts("Foo", &[("u1", "alice", "2024-01-01"), ("u2", "bob", "2024-01-02")]);
    let tags = social_only(&["Foo"]);

    run_update(&adapters, &tags, &paths, LIMITS).await.unwrap();
    let posts_before = std::fs::read(&paths.posts).unwrap();
    let analytics_before = std::fs::read(&paths.analytics).unwrap();

    let summary = run_update(&adapters, &tags, &paths, LIMITS).await.unwrap();

    assert_eq!(summary.new_posts, 0);
    assert!(!summary.analytics_rewritten);
    assert_eq!(std::fs::read(&paths.posts).unwrap(), posts_before);
    assert_eq!(std::fs::read(&paths.analytics).unwrap(), analytics_before);
}

#[tokio::test]
async fn analytics_are_replaced_from_full_history() {
    let dir = tempfile::tempdir().unwrap();
    let paths = DataPaths::in_dir(dir.path());
    let adapters = ScriptedAdapters::default();
    let tags = social_only(&["Foo"]);

    adapters.set_posts("Foo", &[("u1", "alice", "2024-01-01")]);
    run_update(&adapters, &tags, &paths, LIMITS).await.unwrap();

    adapters.set_posts("Foo", &[("u1", "alice", "2024-01-01"), ("u2", "alice", "2024-01-02")]);
    let summary = run_update(&adapters, &tags, &paths, LIMITS).await.unwrap();
    assert_eq!(summary.new_posts, 1);

    let records = AnalyticsFile::new(&paths.analytics).load().unwrap();
    let activity: Vec<_> = records
        .iter()
        .filter(|r| r.metric == Metric::TopPosterActivity)
        .collect();
    assert_eq!(activity.len(), 1, "rows must not accumulate across runs");
    assert_eq!(activity[0].value, 2);
    assert_eq!(
        records.iter().filter(|r| r.metric == Metric::DailyPosts).count(),
        2
    );
}

#[tokio::test]
async fn video_totals_fetched_once_and_forum_always_refreshed() {
    let dir = tempfile::tempdir().unwrap();
    let paths = DataPaths::in_dir(dir.path());
    let adapters = ScriptedAdapters::default();
    let tags = all_platforms(&["Foo"]);

    *adapters.subscribers.lock().unwrap() = 10;
    let first = run_update(&adapters, &tags, &paths, LIMITS).await.unwrap();
    *adapters.subscribers.lock().unwrap() = 25;
    let second = run_update(&adapters, &tags, &paths, LIMITS).await.unwrap();

    assert_eq!(first.videos_added, 1);
    assert_eq!(second.videos_added, 0);
    assert_eq!(adapters.calls_of("video:"), 1);
    assert_eq!(adapters.calls_of("forum:"), 2);

    let forum = ForumTable::load(&paths.forum).unwrap();
    assert_eq!(forum.len(), 1);
    assert_eq!(forum.get("Foo").unwrap().subscriber_count, 25);

    let video = VideoTable::load(&paths.video).unwrap();
    assert_eq!(video.get("Foo").unwrap().total_views, 1_000);

    // No posts arrived, so no analytics file was produced.
    assert!(!first.analytics_rewritten);
    assert!(!paths.analytics.exists());
}

#[tokio::test]
async fn existing_video_row_is_never_requeried() {
    let dir = tempfile::tempdir().unwrap();
    let paths = DataPaths::in_dir(dir.path());
    std::fs::write(
        &paths.video,
        "hashtag,total_views,total_likes,total_comments,top_video_url\nFoo,5,0,0,\n",
    )
    .unwrap();
    let adapters = ScriptedAdapters::default();

    let summary = run_update(&adapters, &all_platforms(&["Foo", "Bar"]), &paths, LIMITS)
        .await
        .unwrap();

    assert_eq!(summary.videos_added, 1);
    assert_eq!(adapters.calls_of("video:Foo"), 0);
    assert_eq!(adapters.calls_of("video:Bar"), 1);
    let video = VideoTable::load(&paths.video).unwrap();
    assert_eq!(video.get("Foo").unwrap().total_views, 5);
    assert!(video.contains("Bar"));
}

#[tokio::test]
async fn one_failing_tag_does_not_stop_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let paths = DataPaths::in_dir(dir.path());
    let adapters = ScriptedAdapters::default();
    adapters.break_posts("Foo");
    adapters.set_posts("Bar", &[("b1", "carol", "2024-02-01")]);

    let summary = run_update(&adapters, &social_only(&["Foo", "Bar"]), &paths, LIMITS)
        .await
        .unwrap();

    assert_eq!(summary.adapter_failures, 1);
    assert_eq!(summary.new_posts, 1);
    let posts = PostLog::new(&paths.posts).load().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].tag, "Bar");
}

#[tokio::test]
async fn corrupt_post_log_aborts_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let paths = DataPaths::in_dir(dir.path());
    std::fs::write(&paths.posts, "hashtag,author\nFoo\n").unwrap();
    let adapters = ScriptedAdapters::default();

    let result = run_update(&adapters, &social_only(&["Foo"]), &paths, LIMITS).await;

    assert!(result.is_err());
    assert_eq!(adapters.calls_of("posts:"), 0);
}

#[tokio::test]
async fn peak_daily_posts_drive_hotness_tiers() {
    let dir = tempfile::tempdir().unwrap();
    let paths = DataPaths::in_dir(dir.path());
    let adapters = ScriptedAdapters::default();
    let volumes = [("A", 5), ("B", 10), ("C", 10), ("D", 40)];
    for (tag, n) in volumes {
        let posts: Vec<(String, String)> = (0..n)
            .map(|i| (format!("{tag}-{i}"), format!("author{i}")))
            .collect();
        let borrowed: Vec<(&str, &str, &str)> = posts
            .iter()
            .map(|(uri, author)| (uri.as_str(), author.as_str(), "2024-05-01"))
            .collect();
        adapters.set_posts(tag, &borrowed);
    }

    run_update(&adapters, &social_only(&["A", "B", "C", "D"]), &paths, LIMITS)
        .await
        .unwrap();

    let records = AnalyticsFile::new(&paths.analytics).load().unwrap();
    let tiers = classify(&social_peaks(&records));
    assert_eq!(tiers["A"], HotnessTier::Low);
    assert_eq!(tiers["B"], HotnessTier::Medium);
    assert_eq!(tiers["D"], HotnessTier::VeryHigh);
}
