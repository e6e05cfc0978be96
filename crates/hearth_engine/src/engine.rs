//! The provisioning facade.
//!
//! [`Provisioner`] chains the catalog, the artifact cache, the world
//! bootstrapper and the properties engine. Every call runs its steps one
//! after the other and stops at the first error.

use crate::bootstrap::{Initializer, WorldBootstrapper};
use crate::cache::ArtifactCache;
use crate::catalog::VersionCatalog;
use crate::config::EngineConfig;
use crate::error::ProvisionError;
use crate::http::HttpFetcher;
use crate::properties::{self, Overrides, ServerProperties};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Input of [`Provisioner::provision_world`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProvisionRequest {
    pub version_id: String,
    pub name: String,
    pub eula_accepted: bool,
    #[serde(default)]
    pub overrides: Overrides,
}

impl ProvisionRequest {
    pub fn new(version_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            version_id: version_id.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn accept_eula(mut self, accepted: bool) -> Self {
        self.eula_accepted = accepted;
        self
    }

    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        self.overrides = overrides;
        self
    }
}

/// Descriptor of a provisioned world. Persisting it is up to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldInstance {
    pub id: Uuid,
    pub name: String,
    pub path: PathBuf,
    pub artifact_version: String,
    pub eula_accepted: bool,
}

/// Result of [`Provisioner::provision_world`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionedWorld {
    pub instance: WorldInstance,
    pub settings: ServerProperties,
}

/// Current state of an existing world directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSummary {
    pub path: PathBuf,
    pub settings: ServerProperties,
    pub eula_accepted: bool,
}

/// Provisions and configures worlds.
#[derive(Clone)]
pub struct Provisioner {
    catalog: VersionCatalog,
    cache: ArtifactCache,
    bootstrapper: WorldBootstrapper,
}

impl Provisioner {
    /// Builds a provisioner from its configuration and collaborators.
    pub fn new(config: &EngineConfig, fetcher: Arc<dyn HttpFetcher>, initializer: Arc<dyn Initializer>) -> Self {
        Self {
            catalog: VersionCatalog::new(config.manifest_url.clone(), fetcher.clone()),
            cache: ArtifactCache::new(config.cache_dir.clone(), fetcher),
            bootstrapper: WorldBootstrapper::new(config.worlds_dir.clone(), initializer)
                .with_cleanup_on_failure(config.cleanup_on_failure),
        }
    }

    pub fn catalog(&self) -> &VersionCatalog {
        &self.catalog
    }

    pub fn cache(&self) -> &ArtifactCache {
        &self.cache
    }

    pub fn worlds_dir(&self) -> &Path {
        self.bootstrapper.worlds_dir()
    }

    /// Creates a brand-new world running `request.version_id`.
    ///
    /// The steps are: validate the overrides, resolve the version, look up
    /// its server artifact, make sure the artifact is cached, create and
    /// initialize a world directory under a fresh UUID, set the EULA flag and
    /// apply the overrides.
    pub async fn provision_world(&self, request: ProvisionRequest) -> Result<ProvisionedWorld, ProvisionError> {
        info!(
            "🚀 Provisioning world `{}` on version {}",
            request.name, request.version_id
        );

        properties::coerce_overrides(&request.overrides)?;

        let version = self.catalog.resolve(&request.version_id).await?;
        let descriptor = self.catalog.fetch_artifact(&version.detail_url).await?;
        let artifact = self.cache.ensure(&descriptor).await?;

        let id = Uuid::new_v4();
        let path = self.bootstrapper.bootstrap(&artifact, &id.to_string()).await?;

        properties::set_eula(&path, request.eula_accepted).await?;
        let settings = properties::apply_overrides(&path, &request.overrides).await?;

        info!("🎉 World `{}` ready at `{}`", request.name, path.display());
        Ok(ProvisionedWorld {
            instance: WorldInstance {
                id,
                name: request.name,
                path,
                artifact_version: artifact.version_id,
                eula_accepted: request.eula_accepted,
            },
            settings,
        })
    }

    /// Merges overrides into an existing world's settings.
    pub async fn update_settings(&self, world_path: &Path, overrides: &Overrides) -> Result<ServerProperties, ProvisionError> {
        properties::apply_overrides(world_path, overrides).await
    }

    pub async fn get_settings(&self, world_path: &Path) -> Result<ServerProperties, ProvisionError> {
        properties::read_settings(world_path).await
    }

    /// Whether the world's EULA is accepted; unreadable files count as no.
    pub async fn get_eula_status(&self, world_path: &Path) -> bool {
        properties::read_eula(world_path).await
    }

    pub async fn set_eula(&self, world_path: &Path, accepted: bool) -> Result<(), ProvisionError> {
        properties::set_eula(world_path, accepted).await
    }

    /// Settings a freshly generated world starts with.
    pub fn default_settings(&self) -> ServerProperties {
        ServerProperties::default()
    }

    pub async fn describe_world(&self, world_path: &Path) -> Result<WorldSummary, ProvisionError> {
        let settings = properties::read_settings(world_path).await?;
        let eula_accepted = properties::read_eula(world_path).await;
        Ok(WorldSummary {
            path: world_path.to_path_buf(),
            settings,
            eula_accepted,
        })
    }
}
