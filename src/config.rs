use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::linear::{DEFAULT_API_URL, DEFAULT_ISSUE_LIMIT};

/// Overrides the base directory (default `~/.git-linear`).
pub const HOME_ENV: &str = "GIT_LINEAR_HOME";

#[derive(Debug, Clone)]
pub struct Config {
    pub base_dir: PathBuf,
    pub api_url: String,
    pub issue_limit: u32,
}

/// On-disk config file (~/.git-linear/config.toml).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub api_url: Option<String>,
    pub issue_limit: Option<u32>,
}

/// Read `<base_dir>/config.toml`, returning defaults if missing or unparseable.
pub fn load_config_file(base_dir: &Path) -> ConfigFile {
    let path = base_dir.join("config.toml");
    match std::fs::read_to_string(&path) {
        Ok(contents) => match toml::from_str::<ConfigFile>(&contents) {
            Ok(cf) => cf,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to parse config.toml, using defaults");
                ConfigFile::default()
            }
        },
        Err(_) => ConfigFile::default(),
    }
}

/// Write a `ConfigFile` to `<base_dir>/config.toml`.
pub fn save_config_file(base_dir: &Path, config_file: &ConfigFile) -> Result<()> {
    std::fs::create_dir_all(base_dir)
        .with_context(|| format!("failed to create {}", base_dir.display()))?;
    let path = base_dir.join("config.toml");
    let contents =
        toml::to_string_pretty(config_file).context("failed to serialize config.toml")?;
    std::fs::write(&path, contents)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

impl Config {
    /// Build a config rooted at `base_dir`, applying `config.toml` on top of
    /// the built-in defaults.
    pub fn new(base_dir: PathBuf) -> Self {
        let file = load_config_file(&base_dir);
        let issue_limit = match file.issue_limit {
            Some(0) | None => DEFAULT_ISSUE_LIMIT,
            Some(n) => n,
        };

        Self {
            base_dir,
            api_url: file.api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            issue_limit,
        }
    }

    pub fn load() -> Result<Self> {
        let base_dir = match std::env::var_os(HOME_ENV) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => {
                let home_dir = dirs::home_dir().context("Could not find home directory")?;
                home_dir.join(".git-linear")
            }
        };

        let config = Self::new(base_dir);
        tracing::debug!(base_dir = %config.base_dir.display(), api_url = %config.api_url, "config loaded");
        Ok(config)
    }

    pub fn log_path(&self) -> PathBuf {
        self.base_dir.join("git-linear.log")
    }

    pub fn credentials_path(&self) -> PathBuf {
        self.base_dir.join("credentials.toml")
    }
}
