use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every variable has a default, so an empty environment yields a usable
/// development config. Parsing is decoupled from the real environment so
/// tests can drive it with a plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>().map_err(|e| invalid(var, e.to_string()))
    };

    let parse_nonzero_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        match parse_u64(var, default)? {
            0 => Err(invalid(var, "must be greater than zero".to_string())),
            n => Ok(n),
        }
    };

    let parse_nonzero_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        match parse_usize(var, default)? {
            0 => Err(invalid(var, "must be greater than zero".to_string())),
            n => Ok(n),
        }
    };

    let require_command = |var: &str, default: &str| -> Result<String, ConfigError> {
        let raw = or_default(var, default);
        if raw.split_whitespace().next().is_none() {
            return Err(invalid(var, "adapter command must not be empty".to_string()));
        }
        Ok(raw)
    };

    let env = parse_environment(&or_default("TAGPULSE_ENV", "development"))?;
    let log_level = or_default("TAGPULSE_LOG_LEVEL", "info");

    let tracking_path = PathBuf::from(or_default("TAGPULSE_TRACKING_PATH", "./config.json"));
    let data_dir = PathBuf::from(or_default("TAGPULSE_DATA_DIR", "./data"));
    let queue_path = PathBuf::from(or_default("TAGPULSE_QUEUE_PATH", "./task_queue.json"));
    let results_path = PathBuf::from(or_default("TAGPULSE_RESULTS_PATH", "./task_results.json"));

    let worker_poll_interval_ms = parse_nonzero_u64("TAGPULSE_WORKER_POLL_INTERVAL_MS", "1000")?;
    let worker_max_concurrent_tasks =
        parse_nonzero_usize("TAGPULSE_WORKER_MAX_CONCURRENT_TASKS", "4")?;
    let task_timeout_secs = match lookup("TAGPULSE_TASK_TIMEOUT_SECS") {
        Ok(raw) if !raw.trim().is_empty() => {
            let var = "TAGPULSE_TASK_TIMEOUT_SECS";
            match raw.trim().parse::<u64>() {
                Ok(0) => return Err(invalid(var, "must be greater than zero".to_string())),
                Ok(secs) => Some(secs),
                Err(e) => return Err(invalid(var, e.to_string())),
            }
        }
        _ => None,
    };

    let post_adapter_cmd = require_command("TAGPULSE_POST_ADAPTER_CMD", "bluesky-scraper")?;
    let forum_adapter_cmd = require_command("TAGPULSE_FORUM_ADAPTER_CMD", "reddit-scraper")?;
    let video_adapter_cmd = require_command("TAGPULSE_VIDEO_ADAPTER_CMD", "youtube-scraper")?;

    let post_fetch_limit = parse_nonzero_usize("TAGPULSE_POST_FETCH_LIMIT", "100")?;
    let video_fetch_limit = parse_nonzero_usize("TAGPULSE_VIDEO_FETCH_LIMIT", "5")?;

    let post_timeout_secs = parse_nonzero_u64("TAGPULSE_POST_TIMEOUT_SECS", "30")?;
    let forum_timeout_secs = parse_nonzero_u64("TAGPULSE_FORUM_TIMEOUT_SECS", "30")?;
    let video_timeout_secs = parse_nonzero_u64("TAGPULSE_VIDEO_TIMEOUT_SECS", "120")?;

    Ok(AppConfig {
        env,
        log_level,
        tracking_path,
        data_dir,
        queue_path,
        results_path,
        worker_poll_interval_ms,
        worker_max_concurrent_tasks,
        task_timeout_secs,
        post_adapter_cmd,
        forum_adapter_cmd,
        video_adapter_cmd,
        post_fetch_limit,
        video_fetch_limit,
        post_timeout_secs,
        forum_timeout_secs,
        video_timeout_secs,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnvVar`] for anything other than
/// `development`, `test`, or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "TAGPULSE_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
