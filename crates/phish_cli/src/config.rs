use phish_api::Environment;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no home directory available to derive a default store path; set PHISH_STORE_DIR")]
    NoHome,
}

/// Resolved runtime configuration, layered from environment variables
/// (optionally pre-loaded from a `.env` file by the caller) with
/// built-in defaults. Invalid overrides are logged and replaced with
/// the default rather than failing startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub store_dir: PathBuf,
    pub hash_prefix_interval: Duration,
    pub filter_set_interval: Duration,
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = match std::env::var("PHISH_ENVIRONMENT").as_deref() {
            Ok("staging") => Environment::Staging,
            _ => Environment::Production,
        };

        let base_url = env_url("PHISH_API_BASE_URL")
            .unwrap_or_else(|| environment.base_url().to_string());

        let store_dir = match std::env::var("PHISH_STORE_DIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => default_store_dir()?,
        };

        let hash_prefix_interval = env_secs("PHISH_HASH_PREFIX_INTERVAL_SECS")
            .unwrap_or(phish_update::DEFAULT_HASH_PREFIX_INTERVAL);
        let filter_set_interval = env_secs("PHISH_FILTER_SET_INTERVAL_SECS")
            .unwrap_or(phish_update::DEFAULT_FILTER_SET_INTERVAL);
        let request_timeout = env_millis("PHISH_REQUEST_TIMEOUT_MS")
            .unwrap_or(Duration::from_millis(5_000));

        Ok(Config { base_url, store_dir, hash_prefix_interval, filter_set_interval, request_timeout })
    }
}

fn env_secs(var: &str) -> Option<Duration> {
    match std::env::var(var) {
        Err(_) => None,
        Ok(raw) => match raw.parse::<u64>() {
            Ok(secs) => Some(Duration::from_secs(secs)),
            Err(err) => {
                tracing::warn!(var, raw, error = %err, "invalid override; falling back to default");
                None
            }
        },
    }
}

fn env_url(var: &str) -> Option<String> {
    match std::env::var(var) {
        Err(_) => None,
        Ok(raw) => match url::Url::parse(&raw) {
            Ok(_) => Some(raw),
            Err(err) => {
                tracing::warn!(var, raw, error = %err, "invalid override; falling back to default");
                None
            }
        },
    }
}

fn env_millis(var: &str) -> Option<Duration> {
    match std::env::var(var) {
        Err(_) => None,
        Ok(raw) => match raw.parse::<u64>() {
            Ok(ms) => Some(Duration::from_millis(ms)),
            Err(err) => {
                tracing::warn!(var, raw, error = %err, "invalid override; falling back to default");
                None
            }
        },
    }
}

/// `$XDG_DATA_HOME/phish-detect/dataset`, falling back to
/// `$HOME/.local/share/phish-detect/dataset`.
fn default_store_dir() -> Result<PathBuf, ConfigError> {
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        return Ok(PathBuf::from(xdg).join("phish-detect").join("dataset"));
    }
    let home = std::env::var("HOME").map_err(|_| ConfigError::NoHome)?;
    Ok(PathBuf::from(home).join(".local/share/phish-detect").join("dataset"))
}
