//! Local artifact cache.
//!
//! Each version owns exactly one file, `<cache_dir>/<version_id>.jar`. The
//! presence of that file is the only record the cache keeps: a hit is
//! returned without re-verifying size or checksum. Downloads are streamed to
//! a uniquely named temporary file next to the final location and renamed
//! into place only after the whole body has arrived and verified, so an
//! interrupted download never leaves a file at the canonical path.

use crate::catalog::ArtifactDescriptor;
use crate::error::ProvisionError;
use crate::http::HttpFetcher;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// File extension of cached server artifacts.
pub const ARTIFACT_EXTENSION: &str = "jar";

/// A server artifact present in the cache directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedArtifact {
    pub local_path: PathBuf,
    pub version_id: String,
}

impl CachedArtifact {
    /// File name of the artifact, used when installing it into a world.
    pub fn file_name(&self) -> String {
        format!("{}.{ARTIFACT_EXTENSION}", self.version_id)
    }
}

/// Download-once store of server artifacts keyed by version id.
#[derive(Clone)]
pub struct ArtifactCache {
    cache_dir: PathBuf,
    fetcher: Arc<dyn HttpFetcher>,
}

impl ArtifactCache {
    pub fn new(cache_dir: impl Into<PathBuf>, fetcher: Arc<dyn HttpFetcher>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            fetcher,
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Canonical cache location for a version.
    ///
    /// Ids that could escape the cache directory are rejected.
    pub fn path_for(&self, version_id: &str) -> Result<PathBuf, ProvisionError> {
        let unsafe_id = version_id.is_empty()
            || version_id == "."
            || version_id.contains("..")
            || version_id.contains(['/', '\\', '\0']);
        if unsafe_id {
            return Err(ProvisionError::Download(format!(
                "version id {version_id:?} cannot be used as a cache key"
            )));
        }

        Ok(self
            .cache_dir
            .join(format!("{version_id}.{ARTIFACT_EXTENSION}")))
    }

    /// Returns the cached artifact, downloading it first on a miss.
    pub async fn ensure(&self, descriptor: &ArtifactDescriptor) -> Result<CachedArtifact, ProvisionError> {
        let path = self.path_for(&descriptor.version_id)?;
        let artifact = CachedArtifact {
            local_path: path.clone(),
            version_id: descriptor.version_id.clone(),
        };

        if is_file(&path).await {
            info!("📦 Artifact `{}` found in cache. Skipping download.", path.display());
            return Ok(artifact);
        }

        info!(
            "⬇️ Downloading artifact from `{}` into `{}`",
            descriptor.download_url,
            path.display()
        );
        self.download(descriptor, &path).await?;
        info!("✅ Cached artifact for version {}", descriptor.version_id);

        Ok(artifact)
    }

    async fn download(&self, descriptor: &ArtifactDescriptor, path: &Path) -> Result<(), ProvisionError> {
        tokio::fs::create_dir_all(&self.cache_dir)
            .await
            .map_err(|error| download_error("creating cache directory", error))?;

        let temp = tempfile::Builder::new()
            .prefix(&format!(".{}-", descriptor.version_id))
            .suffix(".part")
            .tempfile_in(&self.cache_dir)
            .map_err(|error| download_error("creating temporary file", error))?;
        // Dropping `temp_path` before `persist` removes the partial file.
        let (std_file, temp_path) = temp.into_parts();
        let mut file = tokio::fs::File::from_std(std_file);

        let mut stream = self
            .fetcher
            .open(&descriptor.download_url)
            .await
            .map_err(|error| ProvisionError::Download(error.to_string()))?;

        let mut hasher = Sha1::new();
        let mut written: u64 = 0;
        while let Some(chunk) = stream
            .next_chunk()
            .await
            .map_err(|error| ProvisionError::Download(error.to_string()))?
        {
            hasher.update(&chunk);
            file.write_all(&chunk)
                .await
                .map_err(|error| download_error("writing artifact", error))?;
            written += chunk.len() as u64;
        }

        file.flush()
            .await
            .map_err(|error| download_error("flushing artifact", error))?;
        file.sync_all()
            .await
            .map_err(|error| download_error("syncing artifact", error))?;
        drop(file);

        if descriptor.size_bytes > 0 && written != descriptor.size_bytes {
            return Err(ProvisionError::Download(format!(
                "artifact for {} is {written} bytes, expected {}",
                descriptor.version_id, descriptor.size_bytes
            )));
        }

        let digest = hex::encode(hasher.finalize());
        if !descriptor.checksum.is_empty() && !digest.eq_ignore_ascii_case(&descriptor.checksum) {
            return Err(ProvisionError::Download(format!(
                "checksum mismatch for {}: got {digest}, expected {}",
                descriptor.version_id, descriptor.checksum
            )));
        }

        debug!("Verified {} bytes (sha1 {})", written, digest);
        if let Err(error) = temp_path.persist(path) {
            // A concurrent download may have won the rename.
            if is_file(path).await {
                return Ok(());
            }
            return Err(download_error("moving artifact into place", error.error));
        }

        Ok(())
    }
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|metadata| metadata.is_file())
        .unwrap_or(false)
}

fn download_error(action: &str, error: std::io::Error) -> ProvisionError {
    ProvisionError::Download(format!("{action}: {error}"))
}
