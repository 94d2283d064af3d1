//! # Client Configuration
//!
//! Settings are resolved in layers, later layers winning:
//!
//! 1. Built-in defaults
//! 2. TOML file (`--config`, `PATHYVO_CONFIG`, or `<config_dir>/pathyvo/config.toml`)
//! 3. Environment (`PATHYVO_API_URL`, `PATHYVO_TIMEOUT_SECS`, `PATHYVO_SESSION_FILE`)
//! 4. Command-line flags
//!
//! ```toml
//! api_url = "https://pathyvo.app/api"
//! timeout_secs = 30
//! session_file = "/home/ada/.config/pathyvo/session.toml"
//! ```

use crate::error::ConfigError;
use pathyvo_core::primitives::DEFAULT_API_BASE_URL;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const CONFIG_FILE_NAME: &str = "config.toml";
const SESSION_FILE_NAME: &str = "session.toml";

/// `<config_dir>/pathyvo`, when the platform has a config directory.
pub fn app_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("pathyvo"))
}

/// Resolved client settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Backend base URL without a trailing slash.
    pub api_url: String,
    pub timeout: Duration,
    pub session_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            session_file: app_config_dir().map(|dir| dir.join(SESSION_FILE_NAME)),
        }
    }
}

/// On-disk shape; every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    api_url: Option<String>,
    timeout_secs: Option<u64>,
    session_file: Option<PathBuf>,
}

impl Config {
    /// Resolve the configuration from the process environment.
    ///
    /// An explicitly named config file must exist; the default location is
    /// optional.
    pub fn load(
        config_path: Option<&Path>,
        api_url_flag: Option<&str>,
    ) -> Result<Self, ConfigError> {
        Self::load_with(config_path, api_url_flag, |key| std::env::var(key).ok())
    }

    /// Same as [`Config::load`] with an injectable environment lookup.
    pub fn load_with<F>(
        config_path: Option<&Path>,
        api_url_flag: Option<&str>,
        env: F,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        let explicit = config_path
            .map(Path::to_path_buf)
            .or_else(|| env("PATHYVO_CONFIG").map(PathBuf::from));
        match explicit {
            Some(path) => config.apply_file(&path, read_file_config(&path)?)?,
            None => {
                if let Some(path) = app_config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
                    && path.is_file()
                {
                    let file = read_file_config(&path)?;
                    config.apply_file(&path, file)?;
                }
            }
        }

        config.apply_env(&env)?;

        if let Some(url) = api_url_flag {
            config.api_url = normalize_url(url);
        }

        tracing::debug!(api_url = %config.api_url, timeout = ?config.timeout, "configuration resolved");
        Ok(config)
    }

    fn apply_file(&mut self, path: &Path, file: FileConfig) -> Result<(), ConfigError> {
        tracing::debug!("Loaded config file {}", path.display());
        if let Some(url) = file.api_url {
            self.api_url = normalize_url(&url);
        }
        if let Some(secs) = file.timeout_secs {
            self.timeout = timeout_from("timeout_secs", secs)?;
        }
        if let Some(session) = file.session_file {
            self.session_file = Some(session);
        }
        Ok(())
    }

    fn apply_env<F>(&mut self, env: &F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = env("PATHYVO_API_URL") {
            self.api_url = normalize_url(&url);
        }
        if let Some(raw) = env("PATHYVO_TIMEOUT_SECS") {
            let secs = raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidValue {
                    key: "PATHYVO_TIMEOUT_SECS",
                    value: raw.clone(),
                })?;
            self.timeout = timeout_from("PATHYVO_TIMEOUT_SECS", secs)?;
        }
        if let Some(path) = env("PATHYVO_SESSION_FILE") {
            self.session_file = Some(PathBuf::from(path));
        }
        Ok(())
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    toml::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// A zero timeout would fail every request before it is sent.
fn timeout_from(key: &'static str, secs: u64) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(ConfigError::InvalidValue {
            key,
            value: secs.to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}

fn normalize_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
