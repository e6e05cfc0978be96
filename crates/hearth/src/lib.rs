//! # Hearth - Command Line Entry Point
//!
//! Provisions isolated game-server worlds and manages their settings from the
//! command line. This entry point handles CLI parsing, configuration loading,
//! logging setup, and running the selected command.
//!
//! ## Quick Start
//!
//! ```bash
//! # Create a world on the newest release and accept the EULA
//! hearth provision latest --name MyServer --accept-eula --set difficulty=hard
//!
//! # Inspect and change an existing world
//! hearth settings data/worlds/<id>
//! hearth update data/worlds/<id> --set max-players=5
//! hearth eula data/worlds/<id> --accept
//!
//! # Browse the catalog
//! hearth versions --kind snapshot
//! hearth versions --latest
//! ```
//!
//! ## Configuration
//!
//! The tool loads configuration from a TOML file (default: `hearth.toml`).
//! If the file doesn't exist, a default configuration will be created.
//!
//! ## Output
//!
//! Command results are printed to stdout as pretty JSON; logs go to stderr.
//!
//! ## Signal Handling
//!
//! SIGINT (Ctrl+C) and SIGTERM (Unix) cancel the running command.

use tracing::error;

mod app;
mod cli;
mod config;
mod logging;
mod signals;

use app::Application;
use cli::CliArgs;
use config::AppConfig;

/// Main entry point for the Hearth CLI.
///
/// # Exit Codes
///
/// * **0**: The command succeeded
/// * **1**: Error during configuration, setup or the command itself
pub async fn init() -> Result<(), Box<dyn std::error::Error>> {
    // Parse CLI arguments first
    let args = CliArgs::parse();

    // Load configuration to get logging settings
    let mut logging_config = AppConfig::load_from_file(&args.config_path)
        .await
        .unwrap_or_default();
    app::apply_overrides(&mut logging_config, &args);

    if let Err(e) = logging::setup_logging(&logging_config.logging, args.json_logs) {
        eprintln!("❌ Failed to setup logging: {e}");
        std::process::exit(1);
    }

    match Application::new(args).await {
        Ok(app) => {
            if let Err(e) = app.run().await {
                error!("❌ Command failed: {e}");
                std::process::exit(1);
            }
        }
        Err(e) => {
            error!("❌ Failed to start: {e}");
            std::process::exit(1);
        }
    }

    Ok(())
}

// Re-export main types for potential library usage
pub use config::{BootstrapSettings, CatalogSettings, InitializerSettings, LoggingSettings, PathSettings};
pub use cli::{CliCommand, LATEST_RELEASE_ALIAS, LATEST_SNAPSHOT_ALIAS};
