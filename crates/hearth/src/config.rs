//! Configuration management for the Hearth provisioning tool.
//!
//! This module handles loading, validation, and conversion of configuration
//! from TOML files and command-line arguments.

use hearth_engine::{EngineConfig, InitializerConfig, DEFAULT_MANIFEST_URL};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_manifest_url() -> String {
    DEFAULT_MANIFEST_URL.to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_program() -> String {
    "java".to_string()
}

fn default_args() -> Vec<String> {
    vec!["-jar".to_string(), "{artifact}".to_string()]
}

fn default_init_timeout_secs() -> u64 {
    300
}

fn default_cleanup_on_failure() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Application configuration loaded from TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Where artifacts and worlds are stored
    #[serde(default)]
    pub paths: PathSettings,
    /// Upstream version catalog
    #[serde(default)]
    pub catalog: CatalogSettings,
    /// First-run command for new worlds
    #[serde(default)]
    pub initializer: InitializerSettings,
    /// World bootstrap behavior
    #[serde(default)]
    pub bootstrap: BootstrapSettings,
    /// Logging configuration settings
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Storage locations.
///
/// `cache_dir` and `worlds_dir` default to `jarFiles` and `worlds` inside
/// `data_dir`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worlds_dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSettings {
    /// URL of the version manifest
    #[serde(default = "default_manifest_url")]
    pub manifest_url: String,
    /// TCP connect timeout in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Whole-request timeout in seconds (0 disables it)
    #[serde(default)]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializerSettings {
    /// Program run inside the new world directory
    #[serde(default = "default_program")]
    pub program: String,
    /// Arguments; `{artifact}` and `{world}` are substituted
    #[serde(default = "default_args")]
    pub args: Vec<String>,
    /// Seconds before the first run is killed
    #[serde(default = "default_init_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapSettings {
    /// Remove the world directory when bootstrapping fails
    #[serde(default = "default_cleanup_on_failure")]
    pub cleanup_on_failure: bool,
}

/// Logging system configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Whether to output logs in JSON format
    #[serde(default)]
    pub json_format: bool,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            cache_dir: None,
            worlds_dir: None,
        }
    }
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            manifest_url: default_manifest_url(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: 0,
        }
    }
}

impl Default for InitializerSettings {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: default_args(),
            timeout_secs: default_init_timeout_secs(),
        }
    }
}

impl Default for BootstrapSettings {
    fn default() -> Self {
        Self {
            cleanup_on_failure: default_cleanup_on_failure(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    ///
    /// If the file doesn't exist, creates a default configuration file at the specified path
    /// and returns the default configuration.
    pub async fn load_from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if path.exists() {
            let content = tokio::fs::read_to_string(path).await?;
            let config: AppConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content).await?;
            info!("Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    /// Converts the application configuration to an engine configuration.
    pub fn to_engine_config(&self) -> EngineConfig {
        let data_dir = PathBuf::from(&self.paths.data_dir);
        EngineConfig {
            cache_dir: self
                .paths
                .cache_dir
                .as_ref()
                .map(PathBuf::from)
                .unwrap_or_else(|| data_dir.join("jarFiles")),
            worlds_dir: self
                .paths
                .worlds_dir
                .as_ref()
                .map(PathBuf::from)
                .unwrap_or_else(|| data_dir.join("worlds")),
            manifest_url: self.catalog.manifest_url.clone(),
            connect_timeout_secs: self.catalog.connect_timeout_secs,
            request_timeout_secs: self.catalog.request_timeout_secs,
            initializer: InitializerConfig {
                program: self.initializer.program.clone(),
                args: self.initializer.args.clone(),
                timeout_secs: self.initializer.timeout_secs,
            },
            cleanup_on_failure: self.bootstrap.cleanup_on_failure,
        }
    }

    /// Validates the configuration.
    ///
    /// Returns an error string describing the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.paths.data_dir.trim().is_empty() {
            return Err("Data directory cannot be empty".to_string());
        }

        let url = &self.catalog.manifest_url;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(format!("Invalid manifest URL: {url}"));
        }

        if self.catalog.connect_timeout_secs == 0 {
            return Err("catalog.connect_timeout_secs must be greater than 0".to_string());
        }

        if self.initializer.program.trim().is_empty() {
            return Err("Initializer program cannot be empty".to_string());
        }

        if self.initializer.timeout_secs == 0 {
            return Err("initializer.timeout_secs must be greater than 0".to_string());
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: {valid_levels:?}",
                &self.logging.level
            ));
        }

        Ok(())
    }
}
