use anyhow::{Context, Result};
use std::path::Path;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use git_linear::config::Config;

const MAX_LOG_LINES: usize = 1000;
const KEPT_LOG_LINES: usize = 750;

/// Trim the log to its newest [`KEPT_LOG_LINES`] lines once it has grown
/// past [`MAX_LOG_LINES`]. Called before the subscriber opens the file.
pub fn rotate_log(config: &Config) {
    let log_path = config.log_path();
    let content = match std::fs::read_to_string(&log_path) {
        Ok(c) => c,
        Err(_) => return,
    };

    let lines: Vec<&str> = content.lines().collect();
    if lines.len() <= MAX_LOG_LINES {
        return;
    }

    let start = lines.len() - KEPT_LOG_LINES;
    let trimmed = lines[start..].join("\n");
    let _ = std::fs::write(&log_path, format!("{}\n", trimmed));
}

/// Set up file-based logging with tracing-subscriber.
///
/// Logs go to `git-linear.log` in the base directory. `RUST_LOG` overrides
/// the filter; otherwise git-linear's own modules log at DEBUG and every
/// dependency (ureq, keyring, tokio) at WARN. Nothing is written to stderr
/// so the TUI is never drawn over.
pub fn setup_logging(config: &Config) -> Result<()> {
    std::fs::create_dir_all(&config.base_dir)
        .context("Failed to create git-linear base directory for logging")?;

    let log_path = config.log_path();
    let log_file = open_log_file(&log_path)?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("git_linear=debug,warn"));

    let file_layer = fmt::layer()
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    tracing::debug!("Logging initialized, writing to {}", log_path.display());

    Ok(())
}

fn open_log_file(path: &Path) -> Result<std::fs::File> {
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))
}
