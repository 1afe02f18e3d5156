//! Derived metrics, recomputed from the complete post history.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use tagpulse_core::{AnalyticsRecord, Metric, Post};

const TOP_AUTHORS: usize = 5;

const NAIVE_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Calendar date of a post timestamp, taken in the timestamp's own offset.
///
/// Accepts RFC 3339, offset-less `YYYY-MM-DDTHH:MM:SS[.f]`, and bare
/// `YYYY-MM-DD`.
#[must_use]
pub fn post_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.date())
        .or_else(|| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
}

#[derive(Default)]
struct TagStats<'a> {
    daily: BTreeMap<NaiveDate, u64>,
    activity: IndexMap<&'a str, u64>,
    engagement: IndexMap<&'a str, u64>,
}

/// Recompute every analytics row from `posts`.
///
/// Rows come out metric by metric (`daily_posts`, then
/// `top_poster_activity`, then `top_poster_engagement`), tags in first-seen
/// order within each metric. Posts whose timestamp is missing or unparseable
/// are left out of `daily_posts` only.
#[must_use]
pub fn recompute(posts: &[Post]) -> Vec<AnalyticsRecord> {
    let mut by_tag: IndexMap<&str, TagStats<'_>> = IndexMap::new();

    for post in posts {
        let stats = by_tag.entry(post.tag.as_str()).or_default();

        match post.created_at.as_deref().filter(|c| !c.trim().is_empty()) {
            Some(raw) => match post_date(raw) {
                Some(date) => *stats.daily.entry(date).or_insert(0) += 1,
                None => {
                    tracing::warn!(uri = %post.uri, created_at = raw, "unparseable post timestamp");
                }
            },
            None => tracing::warn!(uri = %post.uri, "post has no timestamp"),
        }

        *stats.activity.entry(post.author.as_str()).or_insert(0) += 1;
        let engagement = stats.engagement.entry(post.author.as_str()).or_insert(0);
        *engagement = engagement.saturating_add(post.engagement());
    }

    let mut records = Vec::new();

    for (tag, stats) in &by_tag {
        records.extend(stats.daily.iter().map(|(date, count)| AnalyticsRecord {
            metric: Metric::DailyPosts,
            tag: (*tag).to_string(),
            date: Some(*date),
            author: None,
            value: *count,
        }));
    }
    for (tag, stats) in &by_tag {
        records.extend(leaderboard(Metric::TopPosterActivity, tag, &stats.activity));
    }
    for (tag, stats) in &by_tag {
        records.extend(leaderboard(Metric::TopPosterEngagement, tag, &stats.engagement));
    }

    records
}

/// Top authors by value, descending; ties keep first-encountered order.
fn leaderboard(metric: Metric, tag: &str, totals: &IndexMap<&str, u64>) -> Vec<AnalyticsRecord> {
    let mut ranked: Vec<(&str, u64)> = totals.iter().map(|(a, v)| (*a, *v)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
        .into_iter()
        .take(TOP_AUTHORS)
        .map(|(author, value)| AnalyticsRecord {
            metric,
            tag: tag.to_string(),
            date: None,
            author: Some(author.to_string()),
            value,
        })
        .collect()
}
