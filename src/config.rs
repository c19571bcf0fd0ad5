//! Runtime configuration.
//!
//! Precedence: explicit overrides (CLI) > environment (`CINELITE_*`) > config
//! file (`--config`, `CINELITE_CONFIG`, `./cinelite.toml`) > defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::resource::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, PageLimits};

pub const CONFIG_FILE_NAME: &str = "cinelite.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {var}: {value}")]
    Env { var: String, value: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    pub dir: Option<PathBuf>,
    pub level: String,
    pub retention: usize,
    /// A `log4rs.yaml` to load instead of the built-in appenders.
    pub config_file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { dir: None, level: "info".to_string(), retention: 7, config_file: None }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub data_path: PathBuf,
    pub default_page_size: u64,
    pub max_page_size: u64,
    pub record_requests: bool,
    pub slow_query_ms: u64,
    pub log: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("cinelite.json"),
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
            record_requests: false,
            slow_query_ms: 500,
            log: LogConfig::default(),
        }
    }
}

/// One source of settings; unset fields defer to lower layers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigLayer {
    pub data_path: Option<PathBuf>,
    pub default_page_size: Option<u64>,
    pub max_page_size: Option<u64>,
    pub record_requests: Option<bool>,
    pub slow_query_ms: Option<u64>,
    pub log: LogLayer,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogLayer {
    pub dir: Option<PathBuf>,
    pub level: Option<String>,
    pub retention: Option<usize>,
    pub config_file: Option<PathBuf>,
}

fn parse_env<T: std::str::FromStr>(var: &str, value: String) -> Result<T, ConfigError> {
    value.parse::<T>().map_err(|_| ConfigError::Env { var: var.to_string(), value })
}

fn parse_bool(var: &str, value: String) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Env { var: var.to_string(), value }),
    }
}

impl ConfigLayer {
    /// # Errors
    /// `Parse` when the text is not a valid config document.
    pub fn from_toml(path: &Path, text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    /// # Errors
    /// `Io` or `Parse`.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        Self::from_toml(path, &text)
    }

    /// Reads `CINELITE_*` variables through `get`.
    ///
    /// # Errors
    /// `Env` when a variable is set but does not parse.
    pub fn from_env_with(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut layer = Self::default();
        if let Some(v) = get("CINELITE_DATA") {
            layer.data_path = Some(PathBuf::from(v));
        }
        if let Some(v) = get("CINELITE_DEFAULT_PAGE_SIZE") {
            layer.default_page_size = Some(parse_env("CINELITE_DEFAULT_PAGE_SIZE", v)?);
        }
        if let Some(v) = get("CINELITE_MAX_PAGE_SIZE") {
            layer.max_page_size = Some(parse_env("CINELITE_MAX_PAGE_SIZE", v)?);
        }
        if let Some(v) = get("CINELITE_RECORD_REQUESTS") {
            layer.record_requests = Some(parse_bool("CINELITE_RECORD_REQUESTS", v)?);
        }
        if let Some(v) = get("CINELITE_SLOW_QUERY_MS") {
            layer.slow_query_ms = Some(parse_env("CINELITE_SLOW_QUERY_MS", v)?);
        }
        layer.log.dir = get("CINELITE_LOG_DIR").map(PathBuf::from);
        layer.log.level = get("CINELITE_LOG_LEVEL");
        if let Some(v) = get("CINELITE_LOG_RETENTION") {
            layer.log.retention = Some(parse_env("CINELITE_LOG_RETENTION", v)?);
        }
        layer.log.config_file = get("CINELITE_LOG_CONFIG").map(PathBuf::from);
        Ok(layer)
    }

    /// # Errors
    /// `Env` when a variable is set but does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(|k| std::env::var(k).ok())
    }
}

impl Config {
    /// Overlays every field `layer` sets.
    pub fn apply(&mut self, layer: ConfigLayer) {
        if let Some(v) = layer.data_path {
            self.data_path = v;
        }
        if let Some(v) = layer.default_page_size {
            self.default_page_size = v;
        }
        if let Some(v) = layer.max_page_size {
            self.max_page_size = v;
        }
        if let Some(v) = layer.record_requests {
            self.record_requests = v;
        }
        if let Some(v) = layer.slow_query_ms {
            self.slow_query_ms = v;
        }
        if let Some(v) = layer.log.dir {
            self.log.dir = Some(v);
        }
        if let Some(v) = layer.log.level {
            self.log.level = v;
        }
        if let Some(v) = layer.log.retention {
            self.log.retention = v;
        }
        if let Some(v) = layer.log.config_file {
            self.log.config_file = Some(v);
        }
    }

    /// The first config file that applies: the explicit one, `CINELITE_CONFIG`,
    /// then `./cinelite.toml` if present.
    #[must_use]
    pub fn find_file(explicit: Option<&Path>, env_path: Option<PathBuf>) -> Option<PathBuf> {
        if let Some(p) = explicit {
            return Some(p.to_path_buf());
        }
        if let Some(p) = env_path {
            return Some(p);
        }
        std::env::current_dir().ok().map(|d| d.join(CONFIG_FILE_NAME)).filter(|p| p.exists())
    }

    /// Layers defaults, `file`, `env` and `overrides`, then validates.
    ///
    /// # Errors
    /// `Invalid` when the resulting page sizes are inconsistent.
    pub fn layered(file: Option<ConfigLayer>, env: ConfigLayer, overrides: ConfigLayer) -> Result<Self, ConfigError> {
        let mut cfg = Self::default();
        if let Some(file) = file {
            cfg.apply(file);
        }
        cfg.apply(env);
        cfg.apply(overrides);
        cfg.validate()?;
        Ok(cfg)
    }

    /// Full resolution against the process environment and filesystem.
    ///
    /// # Errors
    /// Unreadable or invalid config file, bad environment values, or an inconsistent result.
    pub fn load(explicit: Option<&Path>, overrides: ConfigLayer) -> Result<Self, ConfigError> {
        let env_path = std::env::var("CINELITE_CONFIG").ok().map(PathBuf::from);
        let file = Self::find_file(explicit, env_path).map(|p| ConfigLayer::from_file(&p)).transpose()?;
        Self::layered(file, ConfigLayer::from_env()?, overrides)
    }

    /// # Errors
    /// `Invalid` unless `1 <= default_page_size <= max_page_size`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_page_size == 0 {
            return Err(ConfigError::Invalid("max_page_size must be positive".to_string()));
        }
        if self.default_page_size == 0 || self.default_page_size > self.max_page_size {
            return Err(ConfigError::Invalid(format!(
                "default_page_size must be between 1 and {}",
                self.max_page_size
            )));
        }
        Ok(())
    }

    #[must_use]
    pub const fn page_limits(&self) -> PageLimits {
        PageLimits { default_page_size: self.default_page_size, max_page_size: self.max_page_size }
    }
}
