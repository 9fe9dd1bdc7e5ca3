use anyhow::{Context, Result};
use log::LevelFilter;
use std::fs::OpenOptions;
use std::io::Write;

use crate::config::ConfigManager;

/// Initialize the logging system.
///
/// Console logging is controlled via `RUST_LOG` (default `info`); a copy of
/// each run's activity also lands in an append-only log file in the config
/// directory:
/// - Linux: ~/.config/hist-sync/hist-sync.log (or $XDG_CONFIG_HOME)
/// - macOS: ~/Library/Application Support/hist-sync/hist-sync.log
/// - Windows: %APPDATA%\hist-sync\hist-sync.log
pub fn init_logger() -> Result<()> {
    ConfigManager::ensure_config_dir()?;

    let default_level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|s| s.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Info);

    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{:5}] {}",
                chrono::Local::now().format("%H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter_level(default_level)
        .target(env_logger::Target::Stderr)
        .try_init()
        .ok(); // Ignore error if logger is already initialized

    Ok(())
}

/// Append a line to the log file only (for details not worth console noise)
pub fn log_to_file(message: &str) -> Result<()> {
    let log_path = ConfigManager::log_file_path()?;

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file: {}", log_path.display()))?;

    writeln!(
        file,
        "[{}] {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        message
    )?;

    Ok(())
}

/// Rotate the log file once it exceeds the size limit
pub fn rotate_log_if_needed() -> Result<()> {
    const MAX_LOG_SIZE: u64 = 1024 * 1024; // 1MB is plenty for a batch tool

    let log_path = ConfigManager::log_file_path()?;
    if !log_path.exists() {
        return Ok(());
    }

    let metadata = std::fs::metadata(&log_path)?;
    if metadata.len() > MAX_LOG_SIZE {
        let old_log_path = log_path.with_extension("log.old");
        if old_log_path.exists() {
            std::fs::remove_file(&old_log_path)?;
        }
        std::fs::rename(&log_path, &old_log_path)?;
        log::debug!("log file rotated to {}", old_log_path.display());
    }

    Ok(())
}
