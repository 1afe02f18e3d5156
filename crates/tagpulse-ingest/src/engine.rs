//! Per-tag ingestion: ask each configured platform for fresh data and merge
//! it into the in-memory dataset.

use std::sync::LazyLock;

use regex::Regex;
use tagpulse_core::{PlatformKind, Post, TrackedTag};

use crate::adapters::{summarize_videos, PlatformAdapters};
use crate::dedup::DedupSet;
use crate::store::{ForumTable, VideoTable};

static FORUM_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/r/([A-Za-z0-9_]+)(?:[/?#]|$)").expect("valid regex"));

/// Forum id from a forum URL's `/r/<id>` path segment.
///
/// The whole segment must be a valid id; a percent-encoded tag such as
/// `C%2B%2B` yields `None` rather than its alphanumeric prefix.
#[must_use]
pub fn forum_id_from_url(url: &str) -> Option<&str> {
    FORUM_ID
        .captures(url)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str())
}

/// What one ingestion pass produced.
#[derive(Debug, Default)]
pub struct IngestOutcome {
    /// Posts never seen before, in admission order.
    pub new_posts: Vec<Post>,
    /// Whether any tag contributed new posts.
    pub touched_any: bool,
    pub forum_refreshed: usize,
    pub videos_added: usize,
    pub adapter_failures: usize,
    /// Platforms skipped because their URL did not yield a usable query.
    pub config_warnings: usize,
}

/// Drives the platform adapters for a list of tracked tags.
pub struct Ingestor<'a, A> {
    adapters: &'a A,
    post_limit: usize,
    video_limit: usize,
}

impl<'a, A: PlatformAdapters> Ingestor<'a, A> {
    #[must_use]
    pub fn new(adapters: &'a A, post_limit: usize, video_limit: usize) -> Self {
        Self {
            adapters,
            post_limit,
            video_limit,
        }
    }

    /// Ingest every tag in order, platforms in the order posts, forum, video.
    ///
    /// - posts: only unseen `uri`s are admitted; admitted `uri`s join `seen`
    ///   so later tags in the same pass cannot admit them again.
    /// - forum: a successful fetch replaces the tag's row.
    /// - video: fetched only for tags that have no row yet.
    ///
    /// Adapter failures are logged and counted; they never stop the pass.
    pub async fn ingest(
        &self,
        tags: &[TrackedTag],
        seen: &mut DedupSet,
        forum: &mut ForumTable,
        video: &mut VideoTable,
    ) -> IngestOutcome {
        let mut outcome = IngestOutcome::default();

        for tracked in tags {
            if tracked.url_for(PlatformKind::Posts).is_some() {
                self.ingest_posts(tracked, seen, &mut outcome).await;
            }

            if let Some(url) = tracked.url_for(PlatformKind::Forum) {
                self.refresh_forum(tracked, url, forum, &mut outcome).await;
            }

            if tracked.url_for(PlatformKind::Video).is_some() {
                if video.contains(&tracked.tag) {
                    tracing::debug!(tag = %tracked.tag, "video totals already recorded; skipping");
                } else {
                    self.add_videos(tracked, video, &mut outcome).await;
                }
            }
        }

        outcome
    }

    async fn ingest_posts(
        &self,
        tracked: &TrackedTag,
        seen: &mut DedupSet,
        outcome: &mut IngestOutcome,
    ) {
        let records = match self
            .adapters
            .fetch_posts(&tracked.tag, self.post_limit)
            .await
        {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(tag = %tracked.tag, error = %e, "post adapter failed");
                outcome.adapter_failures += 1;
                return;
            }
        };

        let fetched = records.len();
        let candidates: Vec<Post> = records
            .into_iter()
            .filter_map(|r| r.into_post(&tracked.tag))
            .collect();
        let admitted = seen.admit(candidates);
        tracing::info!(
            tag = %tracked.tag,
            fetched,
            new = admitted.len(),
            "posts ingested"
        );

        if !admitted.is_empty() {
            outcome.touched_any = true;
            outcome.new_posts.extend(admitted);
        }
    }

    async fn refresh_forum(
        &self,
        tracked: &TrackedTag,
        url: &str,
        forum: &mut ForumTable,
        outcome: &mut IngestOutcome,
    ) {
        let Some(forum_id) = forum_id_from_url(url) else {
            tracing::warn!(tag = %tracked.tag, url, "forum URL has no /r/<id> segment; skipping");
            outcome.config_warnings += 1;
            return;
        };

        match self.adapters.fetch_forum(forum_id).await {
            Ok(Some(snapshot)) => {
                forum.upsert(snapshot.into_aggregate(&tracked.tag, forum_id));
                outcome.forum_refreshed += 1;
                tracing::info!(tag = %tracked.tag, forum_id, "forum snapshot refreshed");
            }
            Ok(None) => {
                tracing::info!(tag = %tracked.tag, forum_id, "forum adapter returned no data");
            }
            Err(e) => {
                tracing::warn!(tag = %tracked.tag, forum_id, error = %e, "forum adapter failed");
                outcome.adapter_failures += 1;
            }
        }
    }

    async fn add_videos(&self, tracked: &TrackedTag, video: &mut VideoTable, outcome: &mut IngestOutcome) {
        match self
            .adapters
            .fetch_videos(&tracked.tag, self.video_limit)
            .await
        {
            Ok(videos) => {
                let row = summarize_videos(&tracked.tag, &videos);
                tracing::info!(
                    tag = %tracked.tag,
                    videos = videos.len(),
                    total_views = row.total_views,
                    "video totals recorded"
                );
                video.upsert(row);
                outcome.videos_added += 1;
            }
            Err(e) => {
                tracing::warn!(tag = %tracked.tag, error = %e, "video adapter failed");
                outcome.adapter_failures += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tagpulse_core::TrackingConfig;

    use super::*;
    use crate::adapters::{ForumSnapshot, PostRecord, VideoRecord};
    use crate::error::AdapterError;

    #[derive(Default)]
    struct FakeAdapters {
        posts: HashMap<String, Vec<&'static str>>,
        failing_posts: Vec<&'static str>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeAdapters {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PlatformAdapters for FakeAdapters {
        async fn fetch_posts(&self, tag: &str, _limit: usize) -> Result<Vec<PostRecord>, AdapterError> {
            self.calls.lock().unwrap().push(format!("posts:{tag}"));
            if self.failing_posts.iter().any(|t| *t == tag) {
                return Err(AdapterError::Timeout {
                    program: "fake".to_string(),
                    timeout: std::time::Duration::from_secs(1),
                });
            }
            Ok(self
                .posts
                .get(tag)
                .into_iter()
                .flatten()
                .map(|uri| PostRecord {
                    author: Some("alice".to_string()),
                    uri: Some((*uri).to_string()),
                    ..PostRecord::default()
                })
                .collect())
        }

        async fn fetch_forum(&self, forum_id: &str) -> Result<Option<ForumSnapshot>, AdapterError> {
            self.calls.lock().unwrap().push(format!("forum:{forum_id}"));
            Ok(Some(ForumSnapshot {
                subscribers: Some(100),
                ..ForumSnapshot::default()
            }))
        }

        async fn fetch_videos(&self, tag: &str, _limit: usize) -> Result<Vec<VideoRecord>, AdapterError> {
            self.calls.lock().unwrap().push(format!("video:{tag}"));
            Ok(vec![VideoRecord {
                url: Some(format!("https://video/{tag}")),
                view_count: Some(10),
                ..VideoRecord::default()
            }])
        }
    }

    fn tags(names: &[&str]) -> Vec<TrackedTag> {
        let tracking: TrackingConfig = serde_json::from_value(serde_json::json!({
            "hashtags": names,
            "platform_url_templates": {
                "bluesky": "https://bsky.app/search?q=%23{}",
                "reddit": "https://www.reddit.com/r/{}/",
                "youtube": "https://www.youtube.com/results?search_query=%23{}",
                "tiktok": "https://www.tiktok.com/tag/{}"
            }
        }))
        .unwrap();
        tracking.tracked_tags()
    }

    struct Tables {
        _dir: tempfile::TempDir,
        forum: ForumTable,
        video: VideoTable,
    }

    fn tables() -> Tables {
        let dir = tempfile::tempdir().unwrap();
        let forum = ForumTable::load(dir.path().join("forum.csv")).unwrap();
        let video = VideoTable::load(dir.path().join("video.csv")).unwrap();
        Tables {
            _dir: dir,
            forum,
            video,
        }
    }

    #[test]
    fn forum_id_extraction() {
        assert_eq!(forum_id_from_url("https://www.reddit.com/r/rust_lang/"), Some("rust_lang"));
        assert_eq!(forum_id_from_url("https://www.reddit.com/r/rust"), Some("rust"));
        assert_eq!(forum_id_from_url("https://www.reddit.com/r/rust?sort=new"), Some("rust"));
        assert_eq!(forum_id_from_url("https://www.reddit.com/search?q=x"), None);
    }

    #[test]
    fn encoded_tag_segment_is_not_truncated() {
        assert_eq!(forum_id_from_url("https://www.reddit.com/r/C%2B%2B/"), None);
        assert_eq!(forum_id_from_url("https://www.reddit.com/r/AI%20in%20Ed/"), None);
    }

    #[tokio::test]
    async fn platforms_run_in_order_per_tag() {
        let fake = FakeAdapters::default();
        let mut t = tables();
        let mut seen = DedupSet::default();

        Ingestor::new(&fake, 100, 5)
            .ingest(&tags(&["Foo", "Bar"]), &mut seen, &mut t.forum, &mut t.video)
            .await;

        assert_eq!(
            fake.calls(),
            vec!["posts:Foo", "forum:Foo", "video:Foo", "posts:Bar", "forum:Bar", "video:Bar"]
        );
    }

    #[tokio::test]
    async fn duplicate_uri_across_tags_is_admitted_once() {
        let fake = FakeAdapters {
            posts: HashMap::from([
                ("Foo".to_string(), vec!["u1", "u2"]),
                ("Bar".to_string(), vec!["u2", "u3"]),
            ]),
            ..FakeAdapters::default()
        };
        let mut t = tables();
        let mut seen = DedupSet::default();

        let outcome = Ingestor::new(&fake, 100, 5)
            .ingest(&tags(&["Foo", "Bar"]), &mut seen, &mut t.forum, &mut t.video)
            .await;

        let admitted: Vec<_> = outcome
            .new_posts
            .iter()
            .map(|p| (p.tag.as_str(), p.uri.as_str()))
            .collect();
        assert_eq!(admitted, vec![("Foo", "u1"), ("Foo", "u2"), ("Bar", "u3")]);
        assert!(outcome.touched_any);
    }

    #[tokio::test]
    async fn post_failure_does_not_stop_other_platforms() {
        let fake = FakeAdapters {
            failing_posts: vec!["Foo"],
            ..FakeAdapters::default()
        };
        let mut t = tables();
        let mut seen = DedupSet::default();

        let outcome = Ingestor::new(&fake, 100, 5)
            .ingest(&tags(&["Foo"]), &mut seen, &mut t.forum, &mut t.video)
            .await;

        assert_eq!(outcome.adapter_failures, 1);
        assert!(!outcome.touched_any);
        assert_eq!(outcome.forum_refreshed, 1);
        assert_eq!(outcome.videos_added, 1);
        assert!(t.forum.contains("Foo"));
        assert!(t.video.contains("Foo"));
    }

    #[tokio::test]
    async fn videos_fetched_only_once_per_tag() {
        let fake = FakeAdapters::default();
        let mut t = tables();
        let mut seen = DedupSet::default();
        let ingestor = Ingestor::new(&fake, 100, 5);
        let foo = tags(&["Foo"]);

        ingestor.ingest(&foo, &mut seen, &mut t.forum, &mut t.video).await;
        let second = ingestor.ingest(&foo, &mut seen, &mut t.forum, &mut t.video).await;

        assert_eq!(second.videos_added, 0);
        assert_eq!(second.forum_refreshed, 1);
        let video_calls = fake.calls().iter().filter(|c| c.starts_with("video:")).count();
        assert_eq!(video_calls, 1);
    }

    #[tokio::test]
    async fn unextractable_forum_url_is_a_config_warning() {
        let fake = FakeAdapters::default();
        let tracking: TrackingConfig = serde_json::from_value(serde_json::json!({
            "hashtags": ["Foo"],
            "platform_url_templates": { "reddit": "https://www.reddit.com/search?q={}" }
        }))
        .unwrap();
        let mut t = tables();
        let mut seen = DedupSet::default();

        let outcome = Ingestor::new(&fake, 100, 5)
            .ingest(&tracking.tracked_tags(), &mut seen, &mut t.forum, &mut t.video)
            .await;

        assert_eq!(outcome.config_warnings, 1);
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn encoded_forum_tag_is_a_config_warning() {
        let fake = FakeAdapters::default();
        let mut t = tables();
        let mut seen = DedupSet::default();
        let tracked: Vec<TrackedTag> = tags(&["C++", "AI in Ed"])
            .into_iter()
            .map(|mut tag| {
                tag.platform_urls.retain(|name, _| name == "reddit");
                tag
            })
            .collect();

        let outcome = Ingestor::new(&fake, 100, 5)
            .ingest(&tracked, &mut seen, &mut t.forum, &mut t.video)
            .await;

        assert_eq!(outcome.config_warnings, 2);
        assert_eq!(outcome.forum_refreshed, 0);
        assert!(fake.calls().is_empty());
        assert!(t.forum.is_empty());
    }
}
