use crate::bindings::{Connection, Credentials};
use crate::domain::constants::{
    CONFIG_DIR, CONFIG_FILE, DEFAULT_API_PREFIX, DEFAULT_POLL_FREQUENCY_SECS, DEFAULT_SERVER_URL,
    DEFAULT_TIMEOUT_SECS,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("HOME is not set; pass --config explicitly")]
    NoHome,
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct ConfigFile {
    pub server: ServerSection,
    pub auth: AuthSection,
    pub output: OutputSection,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct ServerSection {
    pub url: Option<String>,
    pub api_prefix: Option<String>,
    pub verify_ssl: Option<bool>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct AuthSection {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct OutputSection {
    /// Pause between task fetches. `0` re-fetches back to back.
    pub poll_frequency_in_seconds: Option<f64>,
}

/// Values given on the command line; they win over the config file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub server: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Fully resolved settings for one invocation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub connection: Connection,
    pub poll_interval: Duration,
}

pub fn config_path(explicit: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(p) = explicit {
        return Ok(p.to_path_buf());
    }
    let home = std::env::var("HOME").map_err(|_| ConfigError::NoHome)?;
    Ok(PathBuf::from(home).join(CONFIG_DIR).join(CONFIG_FILE))
}

/// A missing file is not an error: every key has a default.
pub fn load_config(path: &Path) -> Result<ConfigFile, ConfigError> {
    if !path.exists() {
        debug!(path = %path.display(), "no config file, using defaults");
        return Ok(ConfigFile::default());
    }
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let cfg = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "config loaded");
    Ok(cfg)
}

pub fn resolve_settings(file: ConfigFile, overrides: Overrides) -> Result<Settings, ConfigError> {
    let poll = file
        .output
        .poll_frequency_in_seconds
        .unwrap_or(DEFAULT_POLL_FREQUENCY_SECS);
    let poll_interval = Duration::try_from_secs_f64(poll).map_err(|e| {
        ConfigError::Invalid(format!(
            "output.poll_frequency_in_seconds must be a non-negative number of seconds, got {poll}: {e}"
        ))
    })?;

    let timeout_secs = file.server.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(ConfigError::Invalid(
            "server.timeout_secs must be greater than zero".to_string(),
        ));
    }

    let username = overrides.username.or(file.auth.username);
    let password = overrides.password.or(file.auth.password);
    let credentials = username.map(|username| Credentials { username, password });

    Ok(Settings {
        connection: Connection {
            url: overrides
                .server
                .or(file.server.url)
                .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string()),
            api_prefix: file
                .server
                .api_prefix
                .unwrap_or_else(|| DEFAULT_API_PREFIX.to_string()),
            verify_ssl: file.server.verify_ssl.unwrap_or(true),
            timeout: Duration::from_secs(timeout_secs),
            credentials,
        },
        poll_interval,
    })
}
