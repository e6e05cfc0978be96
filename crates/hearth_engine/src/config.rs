//! Engine configuration types and defaults.
//!
//! This module contains the configuration structure used to build a
//! [`Provisioner`](crate::Provisioner): where artifacts and worlds live on
//! disk, where the version manifest is fetched from, and how the first run
//! of a new world is performed.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Upstream version manifest used when none is configured.
pub const DEFAULT_MANIFEST_URL: &str = "https://launchermeta.mojang.com/mc/game/version_manifest.json";

/// Configuration structure for the provisioning engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Directory holding one cached artifact per version
    pub cache_dir: PathBuf,

    /// Directory under which every world gets its own subdirectory
    pub worlds_dir: PathBuf,

    /// URL of the version manifest document
    pub manifest_url: String,

    /// TCP connect timeout for upstream requests, in seconds
    pub connect_timeout_secs: u64,

    /// Whole-request timeout for upstream requests, in seconds (0 disables it)
    pub request_timeout_secs: u64,

    /// How the first run of a new world is performed
    pub initializer: InitializerConfig,

    /// Remove a partially bootstrapped world directory on failure
    pub cleanup_on_failure: bool,
}

/// External command that generates a world's default files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitializerConfig {
    /// Program to execute, looked up on `PATH` when not absolute
    pub program: String,

    /// Arguments; `{artifact}` and `{world}` are substituted
    pub args: Vec<String>,

    /// Maximum run time in seconds before the process is killed
    pub timeout_secs: u64,
}

impl EngineConfig {
    /// Builds a configuration rooted at `data_dir`, using the
    /// `jarFiles` and `worlds` subdirectories.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            cache_dir: data_dir.join("jarFiles"),
            worlds_dir: data_dir.join("worlds"),
            ..Self::default()
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }
}

impl InitializerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("data/jarFiles"),
            worlds_dir: PathBuf::from("data/worlds"),
            manifest_url: DEFAULT_MANIFEST_URL.to_string(),
            connect_timeout_secs: 10,
            request_timeout_secs: 0, // artifacts can be large
            initializer: InitializerConfig::default(),
            cleanup_on_failure: true,
        }
    }
}

impl Default for InitializerConfig {
    fn default() -> Self {
        Self {
            program: "java".to_string(),
            args: vec!["-jar".to_string(), "{artifact}".to_string()],
            timeout_secs: 300,
        }
    }
}
