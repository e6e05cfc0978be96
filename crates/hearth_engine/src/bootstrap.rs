//! World bootstrapping.
//!
//! A world is a fresh directory under the worlds root, named after the
//! instance id. Bootstrapping moves linearly through the [`BootstrapStage`]s:
//! the directory is created, the cached artifact is copied in, and the
//! artifact is run once through an [`Initializer`] so it can generate its
//! first-run files (`eula.txt`, `server.properties`, ...).

use crate::cache::CachedArtifact;
use crate::error::ProvisionError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Placeholder replaced by the artifact file name in initializer arguments.
pub const ARTIFACT_PLACEHOLDER: &str = "{artifact}";
/// Placeholder replaced by the world directory in initializer arguments.
pub const WORLD_PLACEHOLDER: &str = "{world}";

/// Progress of a world through bootstrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BootstrapStage {
    DirectoryCreated,
    ArtifactCopied,
    FirstRunExecuted,
    Ready,
}

impl fmt::Display for BootstrapStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self {
            BootstrapStage::DirectoryCreated => "directory creation",
            BootstrapStage::ArtifactCopied => "artifact copy",
            BootstrapStage::FirstRunExecuted => "first run",
            BootstrapStage::Ready => "ready",
        };
        f.write_str(stage)
    }
}

/// Everything an initializer needs to perform the first run of a world.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitRequest {
    pub instance_id: String,
    /// Working directory for the first run
    pub world_path: PathBuf,
    /// Artifact file name, relative to `world_path`
    pub artifact_file: String,
}

/// Failure of a first run.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("failed to launch `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("initializer exited unsuccessfully (exit code {code:?})")]
    Exited { code: Option<i32> },

    #[error("initializer did not finish within {0:?}")]
    TimedOut(Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Runs an artifact once inside a freshly created world.
#[async_trait]
pub trait Initializer: Send + Sync {
    async fn initialize(&self, request: &InitRequest) -> Result<(), InitError>;
}

/// [`Initializer`] that launches an external command in the world directory.
///
/// The child is killed if it outlives `timeout` or if the calling future is
/// dropped.
#[derive(Debug, Clone)]
pub struct CommandInitializer {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandInitializer {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    /// `java -jar {artifact}`, the stock first run of a server jar.
    pub fn java(timeout: Duration) -> Self {
        Self::new(
            "java",
            vec!["-jar".to_string(), ARTIFACT_PLACEHOLDER.to_string()],
            timeout,
        )
    }

    /// Arguments with placeholders substituted for `request`.
    pub fn render_args(&self, request: &InitRequest) -> Vec<String> {
        let world = request.world_path.to_string_lossy();
        self.args
            .iter()
            .map(|arg| {
                arg.replace(ARTIFACT_PLACEHOLDER, &request.artifact_file)
                    .replace(WORLD_PLACEHOLDER, &world)
            })
            .collect()
    }
}

#[async_trait]
impl Initializer for CommandInitializer {
    async fn initialize(&self, request: &InitRequest) -> Result<(), InitError> {
        let args = self.render_args(request);
        debug!("Running `{} {}` in {}", self.program, args.join(" "), request.world_path.display());

        let mut command = tokio::process::Command::new(&self.program);
        command
            .args(&args)
            .current_dir(&request.world_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = command.spawn().map_err(|source| InitError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(output) => output?,
            Err(_) => return Err(InitError::TimedOut(self.timeout)),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if let Some(last_line) = stderr.lines().rev().find(|line| !line.trim().is_empty()) {
                warn!("First run of {} failed: {}", request.instance_id, last_line.trim());
            }
            return Err(InitError::Exited {
                code: output.status.code(),
            });
        }

        Ok(())
    }
}

/// Creates and initializes world directories.
#[derive(Clone)]
pub struct WorldBootstrapper {
    worlds_dir: PathBuf,
    initializer: Arc<dyn Initializer>,
    cleanup_on_failure: bool,
}

impl WorldBootstrapper {
    pub fn new(worlds_dir: impl Into<PathBuf>, initializer: Arc<dyn Initializer>) -> Self {
        Self {
            worlds_dir: worlds_dir.into(),
            initializer,
            cleanup_on_failure: true,
        }
    }

    /// Keep (`false`) or remove (`true`) the world directory when bootstrapping fails.
    pub fn with_cleanup_on_failure(mut self, cleanup_on_failure: bool) -> Self {
        self.cleanup_on_failure = cleanup_on_failure;
        self
    }

    pub fn worlds_dir(&self) -> &Path {
        &self.worlds_dir
    }

    /// Directory of the world belonging to `instance_id`.
    pub fn world_path_for(&self, instance_id: &str) -> PathBuf {
        self.worlds_dir.join(instance_id)
    }

    /// Creates the world for `instance_id` and runs the artifact's first run in it.
    ///
    /// No check is made that the directory is new; instance ids are expected
    /// to be freshly generated UUIDs.
    pub async fn bootstrap(&self, artifact: &CachedArtifact, instance_id: &str) -> Result<PathBuf, ProvisionError> {
        if instance_id.is_empty() || instance_id.contains(['/', '\\', '.']) {
            return Err(ProvisionError::Bootstrap {
                stage: BootstrapStage::DirectoryCreated,
                reason: format!("instance id {instance_id:?} is not a valid directory name"),
            });
        }

        let world_path = self.world_path_for(instance_id);
        info!("🌍 Creating world at `{}`", world_path.display());
        tokio::fs::create_dir_all(&world_path)
            .await
            .map_err(|error| ProvisionError::Bootstrap {
                stage: BootstrapStage::DirectoryCreated,
                reason: error.to_string(),
            })?;

        match self.populate(artifact, instance_id, &world_path).await {
            Ok(()) => {
                info!("✅ World {} is {}", instance_id, BootstrapStage::Ready);
                Ok(world_path)
            }
            Err(error) => {
                if self.cleanup_on_failure {
                    if let Err(cleanup_error) = tokio::fs::remove_dir_all(&world_path).await {
                        warn!(
                            "Failed to remove incomplete world `{}`: {}",
                            world_path.display(),
                            cleanup_error
                        );
                    } else {
                        debug!("Removed incomplete world `{}`", world_path.display());
                    }
                }
                Err(error)
            }
        }
    }

    async fn populate(&self, artifact: &CachedArtifact, instance_id: &str, world_path: &Path) -> Result<(), ProvisionError> {
        let artifact_file = artifact.file_name();
        info!(
            "📋 Copying artifact from `{}` into `{}`",
            artifact.local_path.display(),
            world_path.display()
        );
        tokio::fs::copy(&artifact.local_path, world_path.join(&artifact_file))
            .await
            .map_err(|error| ProvisionError::Bootstrap {
                stage: BootstrapStage::ArtifactCopied,
                reason: format!("{}: {error}", artifact.local_path.display()),
            })?;

        info!("⚙️ Initializing artifact at `{}`...", world_path.display());
        let request = InitRequest {
            instance_id: instance_id.to_string(),
            world_path: world_path.to_path_buf(),
            artifact_file,
        };
        self.initializer
            .initialize(&request)
            .await
            .map_err(|error| ProvisionError::Bootstrap {
                stage: BootstrapStage::FirstRunExecuted,
                reason: error.to_string(),
            })?;

        info!("Artifact successfully initialized at `{}`.", world_path.display());
        Ok(())
    }
}
