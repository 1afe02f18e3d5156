//! Read-only views over the queue, the result log, and the dataset.

use anyhow::Context;
use indexmap::IndexSet;
use tagpulse_core::{AppConfig, TrackingConfig};
use tagpulse_ingest::hotness::{classify, social_peaks, video_views, HotnessTier};
use tagpulse_ingest::store::{write_links, AnalyticsFile, VideoTable};
use tagpulse_ingest::DataPaths;
use tagpulse_queue::{ResultLog, TaskQueue};

/// Print pending queue entries and the `results` most recent task results.
///
/// # Errors
///
/// Returns an error if the queue file or result log is unreadable.
pub(crate) fn run_status(config: &AppConfig, results: usize) -> anyhow::Result<()> {
    let pending = TaskQueue::new(&config.queue_path)
        .pending()
        .context("failed to read task queue")?;
    println!("pending tasks: {}", pending.len());
    for entry in &pending {
        println!(
            "  {:<38}{}",
            entry.task_id,
            entry.command.as_deref().unwrap_or("<no command>")
        );
    }

    let recent = ResultLog::new(&config.results_path)
        .recent(results)
        .context("failed to read task results")?;
    if recent.is_empty() {
        println!("no task results recorded yet");
        return Ok(());
    }

    println!();
    println!("{:<22}{:<11}{:<6}TASK", "FINISHED (UTC)", "STATUS", "EXIT");
    for result in &recent {
        let exit = result
            .exit_code
            .map_or_else(|| "-".to_string(), |c| c.to_string());
        println!(
            "{:<22}{:<11}{:<6}{}",
            result.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            result.status.to_string(),
            exit,
            result.task_id
        );
        if let Some(line) = result.stderr.lines().find(|l| !l.trim().is_empty()) {
            println!("  stderr: {line}");
        }
    }
    Ok(())
}

/// Rewrite the tag/link table from the tracking file.
///
/// # Errors
///
/// Returns an error if the tracking file is invalid or the table cannot be
/// written.
pub(crate) fn run_links(config: &AppConfig) -> anyhow::Result<()> {
    let tracking = TrackingConfig::load(&config.tracking_path)?;
    let path = DataPaths::in_dir(&config.data_dir).links;
    let rows = write_links(&path, &tracking)?;
    println!("wrote {rows} tag row(s) to {}", path.display());
    Ok(())
}

fn tier_label(tier: Option<&HotnessTier>) -> String {
    tier.map_or_else(|| "-".to_string(), |t| format!("{} ({t})", t.level()))
}

/// Print social and video hotness tiers for every tag with data.
///
/// # Errors
///
/// Returns an error if the analytics file or video table is corrupt.
pub(crate) fn run_hotness(config: &AppConfig) -> anyhow::Result<()> {
    let paths = DataPaths::in_dir(&config.data_dir);
    let analytics = AnalyticsFile::new(&paths.analytics).load()?;
    let video = VideoTable::load(&paths.video)?;

    let peaks = social_peaks(&analytics);
    let views = video_views(&video);
    let social_tiers = classify(&peaks);
    let video_tiers = classify(&views);

    let tags: IndexSet<&String> = peaks.keys().chain(views.keys()).collect();
    if tags.is_empty() {
        println!("no analytics or video data yet; run `tagpulse update` first");
        return Ok(());
    }

    println!(
        "{:<24}{:>12}  {:<16}{:>14}  VIDEO TIER",
        "TAG", "PEAK/DAY", "SOCIAL TIER", "VIDEO VIEWS"
    );
    for tag in tags {
        let peak = peaks
            .get(tag)
            .map_or_else(|| "-".to_string(), ToString::to_string);
        let total = views
            .get(tag)
            .map_or_else(|| "-".to_string(), ToString::to_string);
        println!(
            "{:<24}{:>12}  {:<16}{:>14}  {}",
            tag,
            peak,
            tier_label(social_tiers.get(tag)),
            total,
            tier_label(video_tiers.get(tag))
        );
    }
    Ok(())
}
