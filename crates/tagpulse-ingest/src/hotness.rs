//! Quantile-based hotness tiers for comparing tags.

use indexmap::IndexMap;
use tagpulse_core::{AnalyticsRecord, Metric};

use crate::store::VideoTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HotnessTier {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl HotnessTier {
    /// Numeric level, 0 (low) to 3 (very high).
    #[must_use]
    pub fn level(self) -> u8 {
        match self {
            Self::Low => 0,
            Self::Medium => 1,
            Self::High => 2,
            Self::VeryHigh => 3,
        }
    }
}

impl std::fmt::Display for HotnessTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::VeryHigh => "very high",
        };
        f.write_str(s)
    }
}

/// Percentile `p` (0..=100) of ascending `sorted`, linearly interpolated
/// between the closest ranks. `sorted` must be non-empty.
#[allow(clippy::cast_precision_loss)]
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor();
    let upper = rank.ceil();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let (lo, hi) = (sorted[lower as usize], sorted[upper as usize]);
    lo + (hi - lo) * (rank - lower)
}

/// Assign each tag a tier from where its metric falls among all tags'
/// 25th/50th/75th percentiles. A value equal to a boundary takes the lower
/// tier. Empty input yields an empty map.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn classify(values: &IndexMap<String, u64>) -> IndexMap<String, HotnessTier> {
    if values.is_empty() {
        return IndexMap::new();
    }
    let mut sorted: Vec<f64> = values.values().map(|v| *v as f64).collect();
    sorted.sort_by(f64::total_cmp);
    let q25 = percentile(&sorted, 25.0);
    let q50 = percentile(&sorted, 50.0);
    let q75 = percentile(&sorted, 75.0);

    values
        .iter()
        .map(|(tag, value)| {
            let v = *value as f64;
            let tier = if v <= q25 {
                HotnessTier::Low
            } else if v <= q50 {
                HotnessTier::Medium
            } else if v <= q75 {
                HotnessTier::High
            } else {
                HotnessTier::VeryHigh
            };
            (tag.clone(), tier)
        })
        .collect()
}

/// Peak `daily_posts` value per tag.
#[must_use]
pub fn social_peaks(records: &[AnalyticsRecord]) -> IndexMap<String, u64> {
    let mut peaks: IndexMap<String, u64> = IndexMap::new();
    for record in records.iter().filter(|r| r.metric == Metric::DailyPosts) {
        let peak = peaks.entry(record.tag.clone()).or_insert(0);
        *peak = (*peak).max(record.value);
    }
    peaks
}

/// Total video views per tag.
#[must_use]
pub fn video_views(table: &VideoTable) -> IndexMap<String, u64> {
    table
        .rows()
        .map(|row| (row.tag.clone(), row.total_views))
        .collect()
}
