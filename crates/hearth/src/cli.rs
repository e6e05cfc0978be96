//! Command-line interface handling for the Hearth provisioning tool.
//!
//! This module provides command-line argument parsing and CLI interface management
//! using the `clap` crate for robust argument handling.

use clap::{Arg, ArgAction, ArgMatches, Command};
use hearth_engine::{Overrides, VersionKind};
use std::ffi::OsString;
use std::path::PathBuf;

/// Alias resolving to the newest release.
pub const LATEST_RELEASE_ALIAS: &str = "latest";
/// Alias resolving to the newest snapshot.
pub const LATEST_SNAPSHOT_ALIAS: &str = "latest-snapshot";

/// Command line arguments parsed from user input.
///
/// The global options override configuration file settings; the subcommand
/// selects the operation to run.
#[derive(Debug, Clone)]
pub struct CliArgs {
    /// Path to the configuration file
    pub config_path: PathBuf,
    /// Optional override for the data directory
    pub data_dir: Option<PathBuf>,
    /// Optional override for log level
    pub log_level: Option<String>,
    /// Whether to force JSON log output
    pub json_logs: bool,
    /// The operation to perform
    pub command: CliCommand,
}

/// Operations offered by the CLI.
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    /// Create a new world
    Provision {
        version: String,
        name: String,
        accept_eula: bool,
        overrides: Overrides,
    },
    /// Show a world's settings and EULA state
    Settings { world: PathBuf },
    /// Merge overrides into a world's settings
    Update { world: PathBuf, overrides: Overrides },
    /// Show, or with `accept` set, change a world's EULA state
    Eula { world: PathBuf, accept: Option<bool> },
    /// Print the settings a fresh world starts with
    Defaults,
    /// List catalog versions, or print the newest of a kind
    Versions { kind: Option<VersionKind>, latest: bool },
}

impl CliArgs {
    /// Parses the process arguments, exiting with usage on error.
    pub fn parse() -> Self {
        let matches = build_command().get_matches();
        Self::from_matches(&matches)
    }

    /// Parses an explicit argument list.
    pub fn try_parse_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = build_command().try_get_matches_from(args)?;
        Ok(Self::from_matches(&matches))
    }

    fn from_matches(matches: &ArgMatches) -> Self {
        let command = match matches.subcommand() {
            Some(("provision", sub)) => CliCommand::Provision {
                version: string_arg(sub, "version"),
                name: string_arg(sub, "name"),
                accept_eula: sub.get_flag("accept-eula"),
                overrides: collect_overrides(sub),
            },
            Some(("settings", sub)) => CliCommand::Settings {
                world: world_arg(sub),
            },
            Some(("update", sub)) => CliCommand::Update {
                world: world_arg(sub),
                overrides: collect_overrides(sub),
            },
            Some(("eula", sub)) => CliCommand::Eula {
                world: world_arg(sub),
                accept: if sub.get_flag("accept") {
                    Some(true)
                } else if sub.get_flag("decline") {
                    Some(false)
                } else {
                    None
                },
            },
            Some(("versions", sub)) => CliCommand::Versions {
                kind: sub
                    .get_one::<String>("kind")
                    .and_then(|kind| parse_kind(kind)),
                latest: sub.get_flag("latest"),
            },
            _ => CliCommand::Defaults,
        };

        Self {
            config_path: matches
                .get_one::<String>("config")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("hearth.toml")),
            data_dir: matches.get_one::<String>("data-dir").map(PathBuf::from),
            log_level: matches.get_one::<String>("log-level").cloned(),
            json_logs: matches.get_flag("json-logs"),
            command,
        }
    }
}

/// Builds the clap command tree.
pub fn build_command() -> Command {
    Command::new("hearth")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Provision and configure isolated game-server worlds")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("hearth.toml")
                .global(true),
        )
        .arg(
            Arg::new("data-dir")
                .short('d')
                .long("data-dir")
                .value_name("DIR")
                .help("Root directory for cached artifacts and worlds")
                .global(true),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("Log level (trace, debug, info, warn, error)")
                .global(true),
        )
        .arg(
            Arg::new("json-logs")
                .long("json-logs")
                .help("Output logs in JSON format")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(
            Command::new("provision")
                .about("Create a new world from a catalog version")
                .arg(
                    Arg::new("version")
                        .value_name("VERSION")
                        .help("Version id, `latest` or `latest-snapshot`")
                        .required(true),
                )
                .arg(
                    Arg::new("name")
                        .short('n')
                        .long("name")
                        .value_name("NAME")
                        .help("Display name of the world")
                        .required(true),
                )
                .arg(
                    Arg::new("accept-eula")
                        .long("accept-eula")
                        .help("Accept the server EULA for this world")
                        .action(ArgAction::SetTrue),
                )
                .arg(set_arg())
                .arg(overrides_arg()),
        )
        .subcommand(
            Command::new("settings")
                .about("Show a world's settings and EULA state")
                .arg(world_path_arg()),
        )
        .subcommand(
            Command::new("update")
                .about("Merge setting overrides into an existing world")
                .arg(world_path_arg())
                .arg(set_arg())
                .arg(overrides_arg()),
        )
        .subcommand(
            Command::new("eula")
                .about("Show or change a world's EULA state")
                .arg(world_path_arg())
                .arg(
                    Arg::new("accept")
                        .long("accept")
                        .help("Accept the EULA")
                        .action(ArgAction::SetTrue)
                        .conflicts_with("decline"),
                )
                .arg(
                    Arg::new("decline")
                        .long("decline")
                        .help("Decline the EULA")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(Command::new("defaults").about("Print the settings a fresh world starts with"))
        .subcommand(
            Command::new("versions")
                .about("List versions known to the catalog")
                .arg(
                    Arg::new("kind")
                        .short('k')
                        .long("kind")
                        .value_name("KIND")
                        .help("Only show versions of this kind")
                        .value_parser(["release", "snapshot", "old_beta", "old_alpha"]),
                )
                .arg(
                    Arg::new("latest")
                        .long("latest")
                        .help("Print only the newest version of the kind (default: release)")
                        .action(ArgAction::SetTrue),
                ),
        )
}

fn world_path_arg() -> Arg {
    Arg::new("world")
        .value_name("WORLD_DIR")
        .help("Path of the world directory")
        .required(true)
}

fn set_arg() -> Arg {
    Arg::new("set")
        .short('s')
        .long("set")
        .value_name("KEY=VALUE")
        .help("Override one setting; may be repeated")
        .action(ArgAction::Append)
        .value_parser(parse_assignment)
}

fn overrides_arg() -> Arg {
    Arg::new("overrides")
        .long("overrides")
        .value_name("JSON")
        .help("JSON object of setting overrides, applied before --set")
        .value_parser(parse_overrides_json)
}

fn string_arg(matches: &ArgMatches, id: &str) -> String {
    matches.get_one::<String>(id).cloned().unwrap_or_default()
}

fn world_arg(matches: &ArgMatches) -> PathBuf {
    PathBuf::from(string_arg(matches, "world"))
}

fn collect_overrides(matches: &ArgMatches) -> Overrides {
    let mut overrides = matches
        .get_one::<Overrides>("overrides")
        .cloned()
        .unwrap_or_default();
    if let Some(assignments) = matches.get_many::<(String, String)>("set") {
        for (key, value) in assignments {
            overrides.insert(key.clone(), serde_json::Value::String(value.clone()));
        }
    }
    overrides
}

/// Parses a `key=value` assignment. The value may be empty.
pub fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{raw}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in `{raw}`"));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Parses a JSON object of overrides.
pub fn parse_overrides_json(raw: &str) -> Result<Overrides, String> {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(_) => Err("overrides must be a JSON object".to_string()),
        Err(error) => Err(format!("invalid JSON: {error}")),
    }
}

fn parse_kind(raw: &str) -> Option<VersionKind> {
    match raw {
        "release" => Some(VersionKind::Release),
        "snapshot" => Some(VersionKind::Snapshot),
        "old_beta" => Some(VersionKind::OldBeta),
        "old_alpha" => Some(VersionKind::OldAlpha),
        _ => None,
    }
}

/// Maps the `latest` aliases to the kind whose newest version they name.
pub fn version_alias(version: &str) -> Option<VersionKind> {
    match version {
        LATEST_RELEASE_ALIAS => Some(VersionKind::Release),
        LATEST_SNAPSHOT_ALIAS => Some(VersionKind::Snapshot),
        _ => None,
    }
}
