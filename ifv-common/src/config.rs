//! Configuration loading and resolution
//!
//! Settings are resolved per key with the priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing TOML file is not an error: defaults apply and [`ConfigSource`]
//! records it, so the caller can warn once logging is up. A TOML file that
//! exists but cannot be parsed is reported as [`Error::Config`].

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Hosted inference service
pub const DEFAULT_ENDPOINT: &str = "https://indianfoodvision.onrender.com";

/// Local HTTP surface port
pub const DEFAULT_PORT: u16 = 5790;

pub const ENV_ENDPOINT: &str = "IFV_ENDPOINT";
pub const ENV_PORT: &str = "IFV_PORT";
pub const ENV_STATIC_ASSETS: &str = "IFV_STATIC_ASSETS";
pub const ENV_REQUEST_TIMEOUT: &str = "IFV_REQUEST_TIMEOUT_SECS";

/// Bootstrap configuration as read from the TOML file
///
/// Every key is optional; unset keys fall through to compiled defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TomlConfig {
    /// Inference service base URL (`/predict` is appended)
    #[serde(default)]
    pub endpoint: Option<String>,

    /// HTTP server port for `serve`
    #[serde(default)]
    pub port: Option<u16>,

    /// Directory containing the bundled example images
    #[serde(default)]
    pub static_assets: Option<PathBuf>,

    /// Per-request timeout; unset means requests wait for the server
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Built-in defaults for the current platform
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub endpoint: String,
    pub port: u16,
    pub static_assets: PathBuf,
    pub log_level: String,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        let static_assets = dirs::data_local_dir()
            .map(|d| d.join("ifv").join("static"))
            .unwrap_or_else(|| PathBuf::from("./ifv_static"));

        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            port: DEFAULT_PORT,
            static_assets,
            log_level: default_log_level(),
        }
    }
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub endpoint: Option<String>,
    pub port: Option<u16>,
    pub static_assets: Option<PathBuf>,
    pub request_timeout_secs: Option<u64>,
    /// Explicit TOML file; must exist when given
    pub config_file: Option<PathBuf>,
}

/// Where the TOML layer of a resolved config came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    /// No config file found; only CLI, ENV and compiled defaults applied
    Defaults,
}

/// Fully resolved runtime configuration
#[derive(Debug, Clone)]
pub struct IfvConfig {
    /// Base URL without trailing slash
    pub endpoint: String,
    pub port: u16,
    pub static_assets: PathBuf,
    pub request_timeout: Option<Duration>,
    pub logging: LoggingConfig,
    pub source: ConfigSource,
}

impl IfvConfig {
    /// Resolve every setting from CLI → ENV → TOML → compiled default
    pub fn resolve(overrides: &ConfigOverrides) -> Result<Self> {
        let path = overrides.config_file.clone().or_else(default_config_path);

        let (toml_config, source) = match path {
            Some(path) => (load_toml_config(&path)?, ConfigSource::File(path)),
            None => (TomlConfig::default(), ConfigSource::Defaults),
        };

        let mut config =
            Self::from_sources(overrides, &toml_config, CompiledDefaults::for_current_platform())?;
        config.source = source;
        Ok(config)
    }

    /// Merge already-loaded sources (environment is read here)
    pub fn from_sources(
        overrides: &ConfigOverrides,
        toml_config: &TomlConfig,
        defaults: CompiledDefaults,
    ) -> Result<Self> {
        let endpoint = overrides
            .endpoint
            .clone()
            .or_else(|| env_value(ENV_ENDPOINT))
            .or_else(|| toml_config.endpoint.clone())
            .unwrap_or(defaults.endpoint);

        let port = match overrides.port {
            Some(port) => port,
            None => match env_value(ENV_PORT) {
                Some(raw) => parse_env(ENV_PORT, &raw)?,
                None => toml_config.port.unwrap_or(defaults.port),
            },
        };

        let static_assets = overrides
            .static_assets
            .clone()
            .or_else(|| env_value(ENV_STATIC_ASSETS).map(PathBuf::from))
            .or_else(|| toml_config.static_assets.clone())
            .unwrap_or(defaults.static_assets);

        let request_timeout_secs = match overrides.request_timeout_secs {
            Some(secs) => Some(secs),
            None => match env_value(ENV_REQUEST_TIMEOUT) {
                Some(raw) => Some(parse_env(ENV_REQUEST_TIMEOUT, &raw)?),
                None => toml_config.request_timeout_secs,
            },
        };

        Ok(Self {
            endpoint: normalize_endpoint(&endpoint)?,
            port,
            static_assets,
            request_timeout: request_timeout_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            logging: toml_config.logging.clone(),
            source: ConfigSource::Defaults,
        })
    }

    /// Full URL of the classification endpoint
    pub fn predict_url(&self) -> String {
        format!("{}/predict", self.endpoint)
    }
}

/// Load and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;

    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

    Ok(config)
}

/// First existing config file for the platform
///
/// Linux checks `~/.config/ifv/config.toml` then `/etc/ifv/config.toml`;
/// other platforms only the user config directory.
pub fn default_config_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("ifv").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/ifv/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Validate the scheme and strip trailing slashes
pub fn normalize_endpoint(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(Error::Config(format!(
            "Endpoint must be an http(s) URL, got '{}'",
            raw
        )));
    }
    Ok(trimmed.to_string())
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| Error::Config(format!("Invalid {} '{}': {}", name, raw, e)))
}
