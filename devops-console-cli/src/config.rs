//! Console configuration file
//!
//! Reads `config.json` from the platform config directory:
//! - Linux: `~/.config/devops-console/config.json`
//! - macOS: `~/Library/Application Support/devops-console/config.json`
//! - Windows: `%APPDATA%\devops-console\config.json`
//!
//! `DEVOPS_CONSOLE_API_URL` and `DEVOPS_CONSOLE_TOKEN` override the file.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use devops_console_core::ConsoleConfig;

const CONFIG_DIR_NAME: &str = "devops-console";
const CONFIG_FILE_NAME: &str = "config.json";
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024; // 1MB

pub const API_URL_ENV: &str = "DEVOPS_CONSOLE_API_URL";
pub const TOKEN_ENV: &str = "DEVOPS_CONSOLE_TOKEN";

/// Default location of the config file, if the platform has a config directory.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Load the configuration.
///
/// An explicitly given file must exist. A missing default file means
/// "use defaults" so that env variables alone are enough to get started.
pub async fn load(explicit: Option<&Path>) -> Result<ConsoleConfig> {
    let mut config = match explicit {
        Some(path) => read_file(path).await?,
        None => match default_config_path() {
            Some(path) if path.exists() => read_file(&path).await?,
            Some(path) => {
                tracing::debug!("No config file at {}, using defaults", path.display());
                ConsoleConfig::default()
            }
            None => ConsoleConfig::default(),
        },
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config.validate()?;
    Ok(config)
}

async fn read_file(path: &Path) -> Result<ConsoleConfig> {
    let metadata = tokio::fs::metadata(path)
        .await
        .with_context(|| format!("cannot read config file {}", path.display()))?;
    if metadata.len() > MAX_CONFIG_FILE_SIZE {
        bail!(
            "config file too large: {} bytes (max: {MAX_CONFIG_FILE_SIZE} bytes)",
            metadata.len()
        );
    }

    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("cannot read config file {}", path.display()))?;
    tracing::debug!("Loaded config from {}", path.display());

    ConsoleConfig::from_json(&content)
        .with_context(|| format!("invalid config file {}", path.display()))
}

fn apply_env_overrides(config: &mut ConsoleConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(url) = lookup(API_URL_ENV).filter(|v| !v.is_empty()) {
        config.api.base_url = url;
    }
    if let Some(token) = lookup(TOKEN_ENV).filter(|v| !v.is_empty()) {
        config.api.token = Some(token);
    }
}
