use anyhow::Context;
use clap::Subcommand;
use tagpulse_core::{AppConfig, TrackingConfig};
use tagpulse_queue::TaskQueue;

/// Sub-commands available under `tag`.
#[derive(Debug, Subcommand)]
pub enum TagCommands {
    /// Start tracking a tag and queue its first update
    Add {
        /// Tag to track (a leading `#` is ignored)
        name: String,
    },
}

/// Add `name` to the tracking file and queue an update for it.
///
/// A tag that is already tracked (case-insensitive) is left alone and no
/// update is queued.
///
/// # Errors
///
/// Returns an error if the tracking file cannot be read or rewritten, or the
/// tag is blank.
pub(crate) fn run_tag_add(config: &AppConfig, name: &str) -> anyhow::Result<()> {
    let path = &config.tracking_path;
    let mut tracking = if path.exists() {
        TrackingConfig::load(path)?
    } else {
        TrackingConfig::default()
    };

    if !tracking.add_tag(name)? {
        println!("'{}' is already tracked", tagpulse_core::clean_tag(name));
        return Ok(());
    }
    tracking.save(path)?;

    let tag = tagpulse_core::clean_tag(name);
    let command = update_command(tag)?;
    TaskQueue::new(&config.queue_path).enqueue(&command);
    tracing::info!(tag, command = %command, "tag added; update queued");
    println!("now tracking '{tag}'; queued: {command}");
    Ok(())
}

/// Queue an arbitrary shell command.
///
/// # Errors
///
/// Returns an error if the queue file cannot be locked or rewritten.
pub(crate) fn run_enqueue(config: &AppConfig, command: &str) -> anyhow::Result<()> {
    let task_id = TaskQueue::new(&config.queue_path)
        .try_enqueue(command)
        .with_context(|| format!("failed to enqueue into {}", config.queue_path.display()))?;
    println!("queued {task_id}: {command}");
    Ok(())
}

/// The command the worker runs to update one tag with this same binary.
fn update_command(tag: &str) -> anyhow::Result<String> {
    let exe = std::env::current_exe().context("cannot locate the tagpulse executable")?;
    Ok(format!(
        "{} update --tag {}",
        shell_quote(&exe.display().to_string()),
        shell_quote(tag)
    ))
}

/// Quote `arg` for `sh -c` unless it only contains characters that never need it.
#[cfg(not(windows))]
fn shell_quote(arg: &str) -> String {
    if is_plain(arg, "-_./:@%+=,") {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

/// Quote `arg` for `cmd /C`, which only understands double quotes.
#[cfg(windows)]
fn shell_quote(arg: &str) -> String {
    if is_plain(arg, "-_./:\\@+=,") {
        arg.to_string()
    } else {
        format!("\"{}\"", arg.replace('"', "\\\""))
    }
}

fn is_plain(arg: &str, allowed: &str) -> bool {
    !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || allowed.contains(c))
}
