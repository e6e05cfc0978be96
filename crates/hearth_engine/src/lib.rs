//! # Hearth Engine - World Provisioning and Configuration
//!
//! Provisions dedicated game-server worlds from an upstream version catalog
//! and manages their on-disk configuration afterwards. The engine never runs
//! a server for real: it downloads the server artifact, lets it generate its
//! default files once, and from then on owns `server.properties` and
//! `eula.txt`.
//!
//! ## Pipeline
//!
//! A call to [`Provisioner::provision_world`] performs, strictly in order:
//!
//! 1. **Resolve** the requested version id against the version manifest
//! 2. **Describe** the artifact by fetching the version's detail document
//! 3. **Cache** the artifact locally, downloading it only on a miss
//! 4. **Bootstrap** a fresh world directory named after a new UUID, copy the
//!    artifact in and run its first run to generate default files
//! 5. **Accept or decline** the EULA
//! 6. **Merge** the caller's setting overrides and return the typed result
//!
//! The first failing step aborts the call with a [`ProvisionError`].
//!
//! ## Components
//!
//! * [`catalog`] - Version manifest access and resolution
//! * [`cache`] - Download-once artifact store with checksum verification
//! * [`bootstrap`] - World directory creation and first-run invocation
//! * [`properties`] - Typed settings schema, override merging and the EULA flag
//! * [`http`] - The [`HttpFetcher`] seam and its `reqwest` implementation
//!
//! ## Configuration
//!
//! The engine is configured through [`EngineConfig`]:
//!
//! * **Paths** - Artifact cache and worlds root directories
//! * **Upstream** - Manifest URL and HTTP timeouts
//! * **First run** - Initializer command, arguments and timeout
//!
//! ## Example
//!
//! ```no_run
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use hearth_engine::{create_provisioner, EngineConfig};
//! use std::path::Path;
//!
//! let provisioner = create_provisioner(&EngineConfig::default())?;
//! let world = Path::new("data/worlds/5b0c1f7e-8f55-4c1e-9a43-3f8c9d7f2a10");
//!
//! let mut overrides = serde_json::Map::new();
//! overrides.insert("max-players".into(), 5.into());
//! let settings = provisioner.update_settings(world, &overrides).await?;
//! assert_eq!(settings.max_players, 5);
//! # Ok(())
//! # }
//! ```

// Re-export core types and functions for easy access
pub use bootstrap::{BootstrapStage, CommandInitializer, InitError, InitRequest, Initializer, WorldBootstrapper};
pub use cache::{ArtifactCache, CachedArtifact};
pub use catalog::{ArtifactDescriptor, VersionCatalog, VersionDescriptor, VersionKind, VersionManifest};
pub use config::{EngineConfig, InitializerConfig, DEFAULT_MANIFEST_URL};
pub use engine::{ProvisionRequest, ProvisionedWorld, Provisioner, WorldInstance, WorldSummary};
pub use error::{FetchError, ProvisionError};
pub use http::{ByteStream, HttpFetcher, ReqwestFetcher};
pub use properties::{Overrides, PropertiesStore, ServerProperties};
pub use utils::{create_provisioner, create_provisioner_with};

// Public module declarations
pub mod bootstrap;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod http;
pub mod properties;
pub mod utils;

#[cfg(test)]
mod test_support;
mod tests;
