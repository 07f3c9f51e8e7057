//! Host application configuration.
//!
//! Loaded in layers: defaults → YAML file → environment (`APP__*`, `__` as
//! the nesting separator) → CLI overrides.

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::Level;

use super::paths::{default_home_dir, normalize_home_dir};
use crate::ConfigProvider;

/// Main application configuration with strongly-typed global sections
/// and a flexible per-module configuration bag.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Core server configuration.
    pub server: ServerConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Per-module configuration bag: `module_name` → arbitrary JSON/YAML value.
    #[serde(default)]
    pub modules: HashMap<String, serde_json::Value>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            modules: HashMap::new(),
        }
    }
}

impl ConfigProvider for AppConfig {
    fn get_module_config(&self, module_name: &str) -> Option<&serde_json::Value> {
        self.modules.get(module_name)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Base directory for relative log paths; normalized to an absolute path on load.
    pub home_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            home_dir: default_home_dir().unwrap_or_else(|_| PathBuf::from(".beacon")),
        }
    }
}

// ================= Custom serde module for optional Level (supports "off") =================
mod optional_level_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use tracing::Level;

    #[allow(clippy::ref_option, clippy::trivially_copy_pass_by_ref)]
    pub fn serialize<S>(level: &Option<Level>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match level {
            Some(l) => serializer.serialize_str(l.as_str()),
            None => serializer.serialize_str("off"),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Level>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.to_lowercase().as_str() {
            "trace" => Ok(Some(Level::TRACE)),
            "debug" => Ok(Some(Level::DEBUG)),
            "info" => Ok(Some(Level::INFO)),
            "warn" => Ok(Some(Level::WARN)),
            "error" => Ok(Some(Level::ERROR)),
            "off" | "none" => Ok(None),
            _ => Err(serde::de::Error::custom(format!("invalid level: {s}"))),
        }
    }
}

#[allow(clippy::unnecessary_wraps)]
fn default_console_level() -> Option<Level> {
    Some(Level::INFO)
}

#[allow(clippy::unnecessary_wraps)]
fn default_file_level() -> Option<Level> {
    Some(Level::DEBUG)
}

/// Logging configuration: console sink plus an optional rotating file sink.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    #[serde(default = "default_console_level", with = "optional_level_serde")]
    pub console_level: Option<Level>,
    /// Log file, relative to `server.home_dir` unless absolute. Empty disables the file sink.
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_file_level", with = "optional_level_serde")]
    pub file_level: Option<Level>,
    /// Max size of one file in MB before rotation.
    #[serde(default)]
    pub max_size_mb: Option<u64>,
    /// How many rotated files to keep.
    #[serde(default)]
    pub max_backups: Option<usize>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            console_level: default_console_level(),
            file: None,
            file_level: default_file_level(),
            max_size_mb: Some(100),
            max_backups: Some(3),
        }
    }
}

impl LoggingConfig {
    #[must_use]
    pub fn file(&self) -> Option<&str> {
        self.file.as_deref().filter(|s| !s.is_empty())
    }
}

impl AppConfig {
    /// Load configuration with layered loading: defaults → YAML file → environment variables.
    /// Also normalizes `server.home_dir` into an absolute path and creates the directory.
    ///
    /// # Errors
    /// Returns an error if configuration loading or `home_dir` resolution fails.
    pub fn load_layered(config_path: &Path) -> Result<Self> {
        use figment::{
            Figment,
            providers::{Env, Format, Serialized, Yaml},
        };

        let figment = Figment::new()
            .merge(Serialized::defaults(AppConfig::default()))
            .merge(Yaml::file(config_path))
            // Example: APP__LOGGING__CONSOLE_LEVEL=debug maps to logging.console_level
            .merge(Env::prefixed("APP__").split("__"));

        let mut config: AppConfig = figment
            .extract()
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

        config.normalize_home_dir()?;
        Ok(config)
    }

    /// Load configuration from file or fall back to defaults.
    ///
    /// # Errors
    /// Returns an error if the file is missing, invalid, or `home_dir` cannot be resolved.
    pub fn load_or_default(config_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = config_path {
            ensure!(
                path.is_file(),
                "config file does not exist: {}",
                path.display()
            );
            Self::load_layered(path)
        } else {
            let mut c = Self::default();
            c.normalize_home_dir()?;
            Ok(c)
        }
    }

    fn normalize_home_dir(&mut self) -> Result<()> {
        self.server.home_dir =
            normalize_home_dir(&self.server.home_dir).context("Failed to resolve server.home_dir")?;
        Ok(())
    }

    /// Serialize configuration to YAML.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_yaml(&self) -> Result<String> {
        serde_saphyr::to_string(self).context("Failed to serialize config to YAML")
    }

    /// Apply `-v` / `-vv` console verbosity overrides.
    pub fn apply_cli_overrides(&mut self, verbose: u8) {
        self.logging.console_level = match verbose {
            0 => self.logging.console_level,
            1 => Some(Level::DEBUG),
            _ => Some(Level::TRACE),
        };
    }
}
