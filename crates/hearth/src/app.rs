//! Main application logic and lifecycle management.
//!
//! This module contains the `Application` struct that loads configuration,
//! builds the provisioning engine and runs one CLI command against it.

use crate::cli::{version_alias, CliArgs, CliCommand};
use crate::config::AppConfig;
use crate::logging::display_banner;
use crate::signals::wait_for_shutdown;
use hearth_engine::{create_provisioner, Provisioner, ProvisionRequest, VersionKind};
use serde_json::{json, Value};
use tracing::info;

/// One configured invocation of the tool.
pub struct Application {
    /// The command to execute
    command: CliCommand,
    /// Provisioning engine built from the configuration
    provisioner: Provisioner,
}

impl Application {
    /// Creates a new application instance.
    ///
    /// # Process
    ///
    /// 1. Load configuration from file (creating default if missing)
    /// 2. Apply command-line argument overrides
    /// 3. Validate merged configuration
    /// 4. Build the provisioning engine
    pub async fn new(args: CliArgs) -> Result<Self, Box<dyn std::error::Error>> {
        let mut config = AppConfig::load_from_file(&args.config_path).await?;
        info!("✅ Configuration loaded from {}", args.config_path.display());

        apply_overrides(&mut config, &args);

        if let Err(e) = config.validate() {
            return Err(format!("Configuration validation failed: {e}").into());
        }

        display_banner();

        let engine_config = config.to_engine_config();
        info!(
            "📂 Cache: {} | Worlds: {}",
            engine_config.cache_dir.display(),
            engine_config.worlds_dir.display()
        );
        let provisioner = create_provisioner(&engine_config)?;

        Ok(Self {
            command: args.command,
            provisioner,
        })
    }

    /// Runs the command and prints its result as JSON on stdout.
    ///
    /// A termination signal cancels the command.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let output = tokio::select! {
            result = self.execute() => result?,
            signal = wait_for_shutdown() => {
                signal?;
                return Err("Interrupted before the command completed".into());
            }
        };

        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }

    /// Executes the command and returns its JSON result.
    pub async fn execute(&self) -> Result<Value, Box<dyn std::error::Error>> {
        let provisioner = &self.provisioner;
        match &self.command {
            CliCommand::Provision {
                version,
                name,
                accept_eula,
                overrides,
            } => {
                let version_id = self.resolve_version(version).await?;
                let request = ProvisionRequest::new(version_id, name.clone())
                    .accept_eula(*accept_eula)
                    .with_overrides(overrides.clone());
                let world = provisioner.provision_world(request).await?;
                Ok(serde_json::to_value(world)?)
            }
            CliCommand::Settings { world } => {
                let summary = provisioner.describe_world(world).await?;
                Ok(serde_json::to_value(summary)?)
            }
            CliCommand::Update { world, overrides } => {
                let settings = provisioner.update_settings(world, overrides).await?;
                Ok(serde_json::to_value(settings)?)
            }
            CliCommand::Eula { world, accept } => {
                if let Some(accepted) = accept {
                    provisioner.set_eula(world, *accepted).await?;
                }
                let eula_accepted = provisioner.get_eula_status(world).await;
                Ok(json!({ "path": world, "eula_accepted": eula_accepted }))
            }
            CliCommand::Defaults => Ok(serde_json::to_value(provisioner.default_settings())?),
            CliCommand::Versions { kind, latest: true } => {
                let kind = kind.unwrap_or(VersionKind::Release);
                let id = provisioner.catalog().latest(kind).await?;
                Ok(json!({ "kind": kind, "id": id }))
            }
            CliCommand::Versions { kind, latest: false } => {
                let versions = provisioner.catalog().list(*kind).await?;
                Ok(serde_json::to_value(versions)?)
            }
        }
    }

    /// Turns the `latest` aliases into concrete version ids.
    async fn resolve_version(&self, version: &str) -> Result<String, Box<dyn std::error::Error>> {
        match version_alias(version) {
            Some(kind) => {
                let id = self.provisioner.catalog().latest(kind).await?;
                info!("🔎 `{}` is version {}", version, id);
                Ok(id)
            }
            None => Ok(version.to_string()),
        }
    }
}

/// Applies command-line overrides on top of the loaded configuration.
pub fn apply_overrides(config: &mut AppConfig, args: &CliArgs) {
    if let Some(data_dir) = &args.data_dir {
        config.paths.data_dir = data_dir.to_string_lossy().to_string();
        config.paths.cache_dir = None;
        config.paths.worlds_dir = None;
    }

    if let Some(log_level) = &args.log_level {
        config.logging.level = log_level.clone();
    }

    if args.json_logs {
        config.logging.json_format = true;
    }
}
