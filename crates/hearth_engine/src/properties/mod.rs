//! # Properties Engine
//!
//! Reads, merges and writes the per-world `server.properties` and `eula.txt`
//! files, and maps the untyped file contents onto [`ServerProperties`].
//!
//! ## Overrides
//!
//! Overrides arrive as an untyped JSON object. Every entry is checked against
//! the [`SCHEMA`] and coerced into the key's type before the settings file is
//! touched; a single bad entry rejects the whole batch. Accepted values are
//! merged into the existing file in place (new keys are appended), and the
//! complete file is written back atomically.
//!
//! Keys found in the file that the schema does not know are kept as they are
//! and ignored when decoding.

mod eula;
mod schema;
mod store;

pub use eula::{read_eula, set_eula, EULA_FILE};
pub use schema::{PropertyValue, ServerProperties, SettingKind, SettingSpec, SettingValue, SCHEMA};
pub use store::{ParseError, PropertiesStore};

use crate::error::ProvisionError;
use serde_json::{Map, Value};
use std::io;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Name of the settings file inside a world directory.
pub const SETTINGS_FILE: &str = "server.properties";

/// Untyped override input, keyed by on-disk setting name.
pub type Overrides = Map<String, Value>;

/// Location of the settings file of a world.
pub fn settings_path(world_path: &Path) -> PathBuf {
    world_path.join(SETTINGS_FILE)
}

/// Loads the settings file of a world without interpreting it.
pub async fn load_store(world_path: &Path) -> Result<PropertiesStore, ProvisionError> {
    let path = settings_path(world_path);
    let text = tokio::fs::read_to_string(&path)
        .await
        .map_err(|error| ProvisionError::settings_io(&path, error))?;

    PropertiesStore::parse(&text).map_err(|error| {
        ProvisionError::settings_io(&path, io::Error::new(io::ErrorKind::InvalidData, error))
    })
}

/// Decodes a store into typed settings.
pub fn decode(store: &PropertiesStore) -> Result<ServerProperties, ProvisionError> {
    ServerProperties::decode(store)
}

/// Validates every override against the schema.
pub fn coerce_overrides(
    overrides: &Overrides,
) -> Result<Vec<(&'static SettingSpec, SettingValue)>, ProvisionError> {
    overrides
        .iter()
        .map(|(key, value)| -> Result<_, ProvisionError> {
            let spec = SettingSpec::find(key).ok_or_else(|| ProvisionError::InvalidOverride {
                key: key.clone(),
                reason: "not a known setting".to_string(),
            })?;
            let coerced = spec
                .coerce(value)
                .map_err(|reason| ProvisionError::InvalidOverride {
                    key: key.clone(),
                    reason,
                })?;
            Ok((spec, coerced))
        })
        .collect()
}

/// Merges overrides into a world's settings file and returns the result.
pub async fn apply_overrides(
    world_path: &Path,
    overrides: &Overrides,
) -> Result<ServerProperties, ProvisionError> {
    let coerced = coerce_overrides(overrides)?;
    let mut store = load_store(world_path).await?;

    for (spec, value) in &coerced {
        let previous = store.set(spec.key, value.to_string());
        debug!("Setting {} = {} (was {:?})", spec.key, value, previous);
    }

    let settings = ServerProperties::decode(&store)?;
    write_atomically(&settings_path(world_path), store.to_string().as_bytes()).await?;

    if !coerced.is_empty() {
        info!(
            "🛠️ Applied {} setting override(s) to {}",
            coerced.len(),
            world_path.display()
        );
    }
    Ok(settings)
}

/// Reads and decodes a world's settings without modifying them.
pub async fn read_settings(world_path: &Path) -> Result<ServerProperties, ProvisionError> {
    let store = load_store(world_path).await?;
    ServerProperties::decode(&store)
}

/// Replaces `path` with `contents` via a synced temporary file and a rename.
///
/// The replacement keeps the permissions of the file it replaces.
pub(crate) async fn write_atomically(path: &Path, contents: &[u8]) -> Result<(), ProvisionError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let temp = tempfile::Builder::new()
        .prefix(".hearth-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|error| ProvisionError::settings_io(path, error))?;
    let (std_file, temp_path) = temp.into_parts();

    let mut file = tokio::fs::File::from_std(std_file);
    file.write_all(contents)
        .await
        .map_err(|error| ProvisionError::settings_io(path, error))?;
    if let Ok(existing) = tokio::fs::metadata(path).await {
        file.set_permissions(existing.permissions())
            .await
            .map_err(|error| ProvisionError::settings_io(path, error))?;
    }
    file.sync_all()
        .await
        .map_err(|error| ProvisionError::settings_io(path, error))?;
    drop(file);

    temp_path
        .persist(path)
        .map_err(|error| ProvisionError::settings_io(path, error.error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::write_first_run_files;
    use serde_json::json;
    use tempfile::TempDir;

    fn fresh_world() -> TempDir {
        let world = TempDir::new().unwrap();
        write_first_run_files(world.path()).unwrap();
        world
    }

    fn overrides(value: Value) -> Overrides {
        match value {
            Value::Object(map) => map,
            other => panic!("overrides must be an object, got {other}"),
        }
    }

    fn settings_text(world: &TempDir) -> String {
        std::fs::read_to_string(settings_path(world.path())).unwrap()
    }

    #[tokio::test]
    async fn empty_overrides_return_existing_settings() {
        let world = fresh_world();
        let before = read_settings(world.path()).await.unwrap();

        let after = apply_overrides(world.path(), &Overrides::new()).await.unwrap();

        assert_eq!(after, before);
        assert_eq!(after, ServerProperties::default());
    }

    #[tokio::test]
    async fn override_changes_only_its_key() {
        let world = fresh_world();
        let before_text = settings_text(&world);

        let settings = apply_overrides(world.path(), &overrides(json!({"max-players": 5})))
            .await
            .unwrap();

        assert_eq!(settings.max_players, 5);
        let expected = ServerProperties {
            max_players: 5,
            ..ServerProperties::default()
        };
        assert_eq!(settings, expected);
        assert_eq!(
            settings_text(&world),
            before_text.replace("max-players=20\n", "max-players=5\n")
        );
        assert_eq!(read_settings(world.path()).await.unwrap(), expected);
    }

    #[tokio::test]
    async fn string_override_is_written_verbatim() {
        let world = fresh_world();

        let settings = apply_overrides(world.path(), &overrides(json!({"difficulty": "peaceful"})))
            .await
            .unwrap();

        assert_eq!(settings.difficulty, "peaceful");
        assert!(settings_text(&world).contains("\ndifficulty=peaceful\n"));
    }

    #[tokio::test]
    async fn invalid_override_names_the_key_and_leaves_file_alone() {
        let world = fresh_world();
        let before_text = settings_text(&world);

        let error = apply_overrides(
            world.path(),
            &overrides(json!({"motd": "fine", "max-players": "not-a-number"})),
        )
        .await
        .unwrap_err();

        assert!(matches!(error, ProvisionError::InvalidOverride { .. }));
        assert_eq!(error.key(), Some("max-players"));
        assert_eq!(settings_text(&world), before_text);
    }

    #[tokio::test]
    async fn unknown_override_key_is_rejected() {
        let world = fresh_world();

        let error = apply_overrides(world.path(), &overrides(json!({"max-playerz": 5})))
            .await
            .unwrap_err();

        assert_eq!(error.key(), Some("max-playerz"));
    }

    #[tokio::test]
    async fn comments_and_unknown_keys_survive_a_merge() {
        let world = TempDir::new().unwrap();
        std::fs::write(
            settings_path(world.path()),
            "#Minecraft server properties\n# the view\nview-distance=10\nplugin-flag=on\n",
        )
        .unwrap();

        let settings = apply_overrides(world.path(), &overrides(json!({"view-distance": "16", "pvp": "FALSE"})))
            .await
            .unwrap();

        assert_eq!(settings.view_distance, 16);
        assert!(!settings.pvp);
        assert_eq!(
            settings_text(&world),
            "#Minecraft server properties\n# the view\nview-distance=16\nplugin-flag=on\npvp=false\n"
        );
    }

    #[tokio::test]
    async fn missing_settings_file_is_an_io_error() {
        let world = TempDir::new().unwrap();

        let error = read_settings(world.path()).await.unwrap_err();
        assert!(matches!(error, ProvisionError::SettingsIo { .. }));

        let error = apply_overrides(world.path(), &Overrides::new()).await.unwrap_err();
        assert!(matches!(error, ProvisionError::SettingsIo { .. }));
    }

    #[tokio::test]
    async fn undecodable_file_is_a_decode_error() {
        let world = TempDir::new().unwrap();
        std::fs::write(settings_path(world.path()), "max-players=lots\n").unwrap();

        let error = read_settings(world.path()).await.unwrap_err();
        assert!(matches!(error, ProvisionError::Decode { ref key, ref value, .. }
            if key == "max-players" && value == "lots"));
    }

    #[tokio::test]
    async fn atomic_write_leaves_no_temporary_files() {
        let world = TempDir::new().unwrap();
        let path = world.path().join("file.txt");

        write_atomically(&path, b"one").await.unwrap();
        write_atomically(&path, b"two").await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"two");
        assert_eq!(std::fs::read_dir(world.path()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn rewrites_keep_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let world = fresh_world();
        let files = [settings_path(world.path()), world.path().join(EULA_FILE)];
        for file in &files {
            std::fs::set_permissions(file, std::fs::Permissions::from_mode(0o644)).unwrap();
        }

        apply_overrides(world.path(), &Overrides::new()).await.unwrap();
        set_eula(world.path(), true).await.unwrap();

        for file in &files {
            let mode = std::fs::metadata(file).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o644, "{}", file.display());
        }
        assert!(read_eula(world.path()).await);
    }
}
