//! Version catalog backed by the remote version manifest.
//!
//! The catalog fetches the upstream manifest on every call; it never caches
//! manifest or detail documents between calls.

use crate::error::{FetchError, ProvisionError};
use crate::http::HttpFetcher;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Release channel of a manifest entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionKind {
    Release,
    Snapshot,
    OldBeta,
    OldAlpha,
    #[serde(other)]
    Other,
}

impl fmt::Display for VersionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VersionKind::Release => "release",
            VersionKind::Snapshot => "snapshot",
            VersionKind::OldBeta => "old_beta",
            VersionKind::OldAlpha => "old_alpha",
            VersionKind::Other => "other",
        };
        f.write_str(name)
    }
}

/// One entry of the version manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionDescriptor {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: VersionKind,
    /// Location of the per-version detail document
    #[serde(rename = "url")]
    pub detail_url: String,
    #[serde(default)]
    pub time: String,
    #[serde(default, rename = "releaseTime")]
    pub release_time: String,
}

/// Ids of the newest release and snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestVersions {
    #[serde(default)]
    pub release: String,
    #[serde(default)]
    pub snapshot: String,
}

/// The upstream index of all known versions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionManifest {
    #[serde(default)]
    pub latest: LatestVersions,
    pub versions: Vec<VersionDescriptor>,
}

impl VersionManifest {
    /// Exact, case-sensitive lookup of a version id.
    pub fn find(&self, version_id: &str) -> Option<&VersionDescriptor> {
        self.versions.iter().find(|version| version.id == version_id)
    }
}

/// Download location and integrity data of a version's server artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactDescriptor {
    pub version_id: String,
    pub download_url: String,
    /// Lowercase hex SHA-1 of the artifact, empty when upstream omits it
    pub checksum: String,
    pub size_bytes: u64,
}

#[derive(Debug, Deserialize)]
struct VersionDetail {
    id: String,
    #[serde(default)]
    downloads: VersionDownloads,
}

#[derive(Debug, Default, Deserialize)]
struct VersionDownloads {
    server: Option<VersionDownload>,
}

#[derive(Debug, Deserialize)]
struct VersionDownload {
    #[serde(default)]
    sha1: String,
    #[serde(default)]
    size: u64,
    url: String,
}

/// Resolves version ids against the remote manifest.
#[derive(Clone)]
pub struct VersionCatalog {
    manifest_url: String,
    fetcher: Arc<dyn HttpFetcher>,
}

impl VersionCatalog {
    pub fn new(manifest_url: impl Into<String>, fetcher: Arc<dyn HttpFetcher>) -> Self {
        Self {
            manifest_url: manifest_url.into(),
            fetcher,
        }
    }

    pub fn manifest_url(&self) -> &str {
        &self.manifest_url
    }

    /// Downloads and parses the version manifest.
    pub async fn fetch_manifest(&self) -> Result<VersionManifest, ProvisionError> {
        debug!("📥 Fetching version manifest from {}", self.manifest_url);
        let body = self
            .fetcher
            .get_bytes(&self.manifest_url)
            .await
            .map_err(upstream)?;

        serde_json::from_slice(&body).map_err(|error| {
            ProvisionError::Upstream(format!(
                "invalid manifest from {}: {error}",
                self.manifest_url
            ))
        })
    }

    /// Resolves a version id to its manifest entry.
    ///
    /// Matching is exact and case-sensitive; `1.20` never matches `1.20.1`.
    pub async fn resolve(&self, version_id: &str) -> Result<VersionDescriptor, ProvisionError> {
        let manifest = self.fetch_manifest().await?;
        match manifest.find(version_id) {
            Some(version) => {
                info!("🔎 Resolved version {} ({})", version.id, version.kind);
                Ok(version.clone())
            }
            None => Err(ProvisionError::NotFound {
                version_id: version_id.to_string(),
            }),
        }
    }

    /// Fetches a version detail document and extracts the server artifact.
    pub async fn fetch_artifact(&self, detail_url: &str) -> Result<ArtifactDescriptor, ProvisionError> {
        let body = self.fetcher.get_bytes(detail_url).await.map_err(upstream)?;
        let detail: VersionDetail = serde_json::from_slice(&body).map_err(|error| {
            ProvisionError::Upstream(format!("invalid version detail from {detail_url}: {error}"))
        })?;

        let server = detail.downloads.server.ok_or_else(|| {
            ProvisionError::Upstream(format!(
                "version {} has no server download",
                detail.id
            ))
        })?;

        Ok(ArtifactDescriptor {
            version_id: detail.id,
            download_url: server.url,
            checksum: server.sha1.to_ascii_lowercase(),
            size_bytes: server.size,
        })
    }

    /// Returns the id the manifest advertises as latest for `kind`.
    ///
    /// Only releases and snapshots have a "latest" pointer.
    pub async fn latest(&self, kind: VersionKind) -> Result<String, ProvisionError> {
        let manifest = self.fetch_manifest().await?;
        let id = match kind {
            VersionKind::Release => manifest.latest.release,
            VersionKind::Snapshot => manifest.latest.snapshot,
            other => {
                return Err(ProvisionError::Upstream(format!(
                    "manifest has no latest pointer for {other} versions"
                )))
            }
        };

        if id.is_empty() {
            return Err(ProvisionError::Upstream(format!(
                "manifest does not name a latest {kind}"
            )));
        }
        Ok(id)
    }

    /// Lists manifest entries in manifest order, optionally filtered by kind.
    pub async fn list(&self, kind: Option<VersionKind>) -> Result<Vec<VersionDescriptor>, ProvisionError> {
        let manifest = self.fetch_manifest().await?;
        Ok(manifest
            .versions
            .into_iter()
            .filter(|version| kind.map_or(true, |kind| version.kind == kind))
            .collect())
    }
}

fn upstream(error: FetchError) -> ProvisionError {
    ProvisionError::Upstream(error.to_string())
}
