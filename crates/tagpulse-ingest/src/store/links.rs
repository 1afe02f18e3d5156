use std::path::Path;

use tagpulse_core::{clean_tag, TrackingConfig};

use crate::error::StoreError;

/// Rewrite the tag/link table read by the report renderer
/// (`hashtag_links.csv`): a `Hashtag` column followed by one column per
/// configured platform, one row per tracked tag.
///
/// # Errors
///
/// Returns [`StoreError`] on serialization or I/O failure.
pub fn write_links(path: &Path, tracking: &TrackingConfig) -> Result<usize, StoreError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let header = std::iter::once("Hashtag")
        .chain(tracking.platform_url_templates.keys().map(String::as_str));
    writer
        .write_record(header)
        .map_err(|e| StoreError::csv(path, e))?;

    let tags = tracking.tracked_tags();
    for tracked in &tags {
        let label = format!("#{}", clean_tag(&tracked.tag));
        let row = std::iter::once(label.as_str())
            .chain(tracked.platform_urls.values().map(String::as_str));
        writer.write_record(row).map_err(|e| StoreError::csv(path, e))?;
    }

    let body = writer
        .into_inner()
        .map_err(|e| StoreError::io(path, e.into_error()))?;
    tagpulse_core::atomic_write(path, &body).map_err(|e| StoreError::io(path, e))?;
    Ok(tags.len())
}
