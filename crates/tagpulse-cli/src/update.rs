use anyhow::Context;
use tagpulse_core::{AppConfig, TrackingConfig};
use tagpulse_ingest::{DataPaths, FetchLimits, ProcessAdapters};

/// Run one incremental update for every tracked tag, or only `tag`.
///
/// # Errors
///
/// Returns an error if the tracking file is missing or invalid, `tag` is not
/// configured, or the dataset cannot be read or written.
pub(crate) async fn run_update(config: &AppConfig, tag: Option<&str>) -> anyhow::Result<()> {
    let tracking = TrackingConfig::load(&config.tracking_path)?;
    let tags = match tag {
        Some(name) => vec![tracking.tracked_tag(name)?],
        None => tracking.tracked_tags(),
    };
    if tags.is_empty() {
        println!(
            "no tags configured in {}; add one with `tagpulse tag add <NAME>`",
            config.tracking_path.display()
        );
        return Ok(());
    }

    let adapters = ProcessAdapters::from_config(config);
    let paths = DataPaths::in_dir(&config.data_dir);
    let summary = tagpulse_ingest::run_update(
        &adapters,
        &tags,
        &paths,
        FetchLimits::from_config(config),
    )
    .await
    .with_context(|| format!("update failed for data in {}", config.data_dir.display()))?;

    println!(
        "update complete: tags={} new_posts={} forum_refreshed={} videos_added={} adapter_failures={}",
        summary.tags,
        summary.new_posts,
        summary.forum_refreshed,
        summary.videos_added,
        summary.adapter_failures
    );
    if summary.config_warnings > 0 {
        println!("  {} platform URL(s) skipped; see warnings above", summary.config_warnings);
    }
    if summary.analytics_rewritten {
        println!(
            "  analytics rewritten: {} records -> {}",
            summary.analytics_records,
            paths.analytics.display()
        );
    } else {
        println!("  no new posts; analytics unchanged");
    }
    Ok(())
}
