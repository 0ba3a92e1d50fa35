use crate::types::*;
use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

pub const APP_NAME: &str = "devcontainer.vim";
pub const BIN_DIR_NAME: &str = "bin";
pub const CONFIG_DIR_NAME: &str = "config";
pub const SETTINGS_FILE_NAME: &str = "config.json";

pub const CACHE_DIR_ENV: &str = "DEVCONTAINER_VIM_CACHE_DIR";
pub const SETTINGS_FILE_ENV: &str = "DEVCONTAINER_VIM_CONFIG";
pub const GITHUB_API_URL_ENV: &str = "DEVCONTAINER_VIM_GITHUB_API_URL";
pub const CONTAINER_ENGINE_ENV: &str = "DEVCONTAINER_VIM_CONTAINER_ENGINE";

/// Cache locations: `install_dir` holds tool binaries, `app_config_dir`
/// the per-workspace merged configurations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppDirs {
    pub cache_dir: PathBuf,
    pub install_dir: PathBuf,
    pub app_config_dir: PathBuf,
}

impl AppDirs {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            install_dir: cache_dir.join(BIN_DIR_NAME),
            app_config_dir: cache_dir.join(CONFIG_DIR_NAME),
            cache_dir,
        }
    }

    pub fn create(&self) -> Result<()> {
        for dir in [&self.install_dir, &self.app_config_dir] {
            fs::create_dir_all(dir)
                .with_context(|| format!("Could not create {}", dir.display()))?;
        }
        Ok(())
    }
}

pub fn get_user_cache_dir() -> Result<PathBuf> {
    let path = match std::env::var_os(CACHE_DIR_ENV) {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine cache directory"))?
            .join(APP_NAME),
    };
    tracing::debug!("User cache directory: {}", path.display());
    Ok(path)
}

pub fn get_app_dirs() -> Result<AppDirs> {
    let dirs = AppDirs::new(get_user_cache_dir()?);
    dirs.create()?;
    Ok(dirs)
}

pub fn get_settings_file_path() -> Result<PathBuf> {
    let path = match std::env::var_os(SETTINGS_FILE_ENV) {
        Some(file) if !file.is_empty() => PathBuf::from(file),
        _ => dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
            .join(APP_NAME)
            .join(SETTINGS_FILE_NAME),
    };
    tracing::debug!("Settings file path: {}", path.display());
    Ok(path)
}

pub fn load_settings() -> Result<Settings> {
    let settings_path = get_settings_file_path()?;

    let mut settings = if settings_path.exists() {
        let content = fs::read_to_string(&settings_path).with_context(|| {
            format!("Could not read settings file at {}", settings_path.display())
        })?;
        parse_settings(&content)
            .with_context(|| format!("Could not parse {} as JSON", settings_path.display()))?
    } else {
        Settings::default()
    };

    // Apply environment variable overrides
    if let Ok(url) = std::env::var(GITHUB_API_URL_ENV) {
        if !url.is_empty() {
            settings.github_api_url = url;
        }
    }

    if let Ok(engine) = std::env::var(CONTAINER_ENGINE_ENV) {
        if !engine.is_empty() {
            settings.container_engine = engine;
        }
    }

    Ok(settings)
}

/// Parse a settings file. The top level must be a JSON object.
pub fn parse_settings(content: &str) -> Result<Settings> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    if !value.is_object() {
        anyhow::bail!("settings must be a JSON object");
    }
    Ok(serde_json::from_value(value)?)
}

pub fn github_token() -> Option<String> {
    std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty())
}
