//! Client configuration persistence.
//!
//! The config lives in `client_config.json` under the platform data
//! directory. Writes go through a temp file and a rename so a crash never
//! leaves a half-written file behind.

use std::fs;
use std::path::{Path, PathBuf};

use clonegpt_types::ClientConfig;
use validator::Validate;

use crate::error::{AppError, AppResult};

const CONFIG_FILE: &str = "client_config.json";
const DATA_DIR: &str = "clonegpt";

/// Platform data directory for the client, created on first use.
pub fn get_data_dir() -> AppResult<PathBuf> {
    let base = dirs::data_dir()
        .ok_or_else(|| AppError::Config("failed to resolve data directory".to_string()))?;
    let dir = base.join(DATA_DIR);
    if !dir.exists() {
        fs::create_dir_all(&dir)?;
    }
    Ok(dir)
}

pub fn config_path() -> AppResult<PathBuf> {
    Ok(get_data_dir()?.join(CONFIG_FILE))
}

pub fn load_config() -> AppResult<ClientConfig> {
    load_config_from(&config_path()?)
}

/// Load and validate. A missing file yields the defaults.
pub fn load_config_from(path: &Path) -> AppResult<ClientConfig> {
    if !path.exists() {
        tracing::debug!("[Config] {} not found, using defaults", path.display());
        return Ok(ClientConfig::new());
    }

    let content = fs::read_to_string(path)?;
    let config: ClientConfig = serde_json::from_str(&content)
        .map_err(|e| AppError::Config(format!("failed to parse {}: {}", path.display(), e)))?;
    validate(&config)?;
    Ok(config)
}

pub fn save_config(config: &ClientConfig) -> AppResult<()> {
    save_config_to(&config_path()?, config)
}

pub fn save_config_to(path: &Path, config: &ClientConfig) -> AppResult<()> {
    validate(config)?;
    let content = serde_json::to_string_pretty(config)?;

    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, content)?;
    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    tracing::info!("[Config] Saved {}", path.display());
    Ok(())
}

/// Load, mutate, and save in one step.
pub fn update_config<F>(updater: F) -> AppResult<ClientConfig>
where
    F: FnOnce(&mut ClientConfig),
{
    update_config_at(&config_path()?, updater)
}

pub fn update_config_at<F>(path: &Path, updater: F) -> AppResult<ClientConfig>
where
    F: FnOnce(&mut ClientConfig),
{
    let mut config = load_config_from(path)?;
    updater(&mut config);
    save_config_to(path, &config)?;
    Ok(config)
}

/// Host entry point: load the config and install logging at its `log_level`.
pub fn bootstrap() -> AppResult<ClientConfig> {
    bootstrap_from(&config_path()?)
}

pub fn bootstrap_from(path: &Path) -> AppResult<ClientConfig> {
    let config = load_config_from(path)?;
    crate::logger::init_logger(&config.log_level);
    Ok(config)
}

fn validate(config: &ClientConfig) -> AppResult<()> {
    config.validate().map_err(|e| AppError::Config(e.to_string()))
}
