//! Error types and handling for the provisioning engine.
//!
//! This module defines the error types that can occur while provisioning and
//! configuring worlds, providing clear categorization of the failure modes of
//! each pipeline stage.

use crate::bootstrap::BootstrapStage;
use std::path::PathBuf;

/// Enumeration of possible provisioning errors.
///
/// Every engine operation aborts on the first error it encounters; callers
/// receive one of these variants and decide themselves whether to retry.
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    /// The manifest does not list the requested version id
    #[error("Version not found: {version_id}")]
    NotFound { version_id: String },

    /// Manifest or version-detail fetch/parse failure
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Artifact transfer or cache write failure
    #[error("Download error: {0}")]
    Download(String),

    /// World directory creation, artifact copy or first-run failure
    #[error("Bootstrap error during {stage}: {reason}")]
    Bootstrap { stage: BootstrapStage, reason: String },

    /// Override key unknown to the schema or value not coercible to its type
    #[error("Invalid override for `{key}`: {reason}")]
    InvalidOverride { key: String, reason: String },

    /// A stored settings value cannot be parsed as its declared type
    #[error("Cannot decode `{key}` from stored value {value:?}: {reason}")]
    Decode {
        key: String,
        value: String,
        reason: String,
    },

    /// Settings or EULA file could not be read or written
    #[error("Settings I/O error at {}: {source}", path.display())]
    SettingsIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ProvisionError {
    pub(crate) fn settings_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::SettingsIo {
            path: path.into(),
            source,
        }
    }

    /// Returns the settings key this error refers to, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::InvalidOverride { key, .. } | Self::Decode { key, .. } => Some(key),
            _ => None,
        }
    }
}

/// Errors produced by an [`HttpFetcher`](crate::http::HttpFetcher).
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Connection, TLS, timeout or body read failure
    #[error("Request to {url} failed: {message}")]
    Request { url: String, message: String },

    /// The server answered with a non-success status
    #[error("Request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// Writing the received body failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
