//! EULA acceptance flag.
//!
//! The flag is toggled by swapping the first `true`/`false` token in the
//! file, leaving comments and formatting alone.

use super::write_atomically;
use crate::error::ProvisionError;
use std::path::Path;
use tracing::{debug, info};

/// Name of the EULA file inside a world directory.
pub const EULA_FILE: &str = "eula.txt";

fn token(accepted: bool) -> &'static [u8] {
    if accepted {
        b"true"
    } else {
        b"false"
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Sets the EULA flag of a world.
///
/// A file that does not contain the opposite token is left untouched, so
/// repeating a call is a successful no-op.
pub async fn set_eula(world_path: &Path, accepted: bool) -> Result<(), ProvisionError> {
    let path = world_path.join(EULA_FILE);
    let contents = tokio::fs::read(&path)
        .await
        .map_err(|error| ProvisionError::settings_io(&path, error))?;

    let current = token(!accepted);
    let Some(position) = find(&contents, current) else {
        debug!("EULA in {} already {}", world_path.display(), accepted);
        return Ok(());
    };

    let mut updated = Vec::with_capacity(contents.len() + 1);
    updated.extend_from_slice(&contents[..position]);
    updated.extend_from_slice(token(accepted));
    updated.extend_from_slice(&contents[position + current.len()..]);

    write_atomically(&path, &updated).await?;
    info!("📜 EULA for {} set to {}", world_path.display(), accepted);
    Ok(())
}

/// Returns whether the world's EULA has been accepted.
///
/// Any read failure, including a missing file, counts as not accepted.
pub async fn read_eula(world_path: &Path) -> bool {
    match tokio::fs::read(world_path.join(EULA_FILE)).await {
        Ok(contents) => find(&contents, b"true").is_some(),
        Err(error) => {
            debug!("Cannot read EULA in {}: {}", world_path.display(), error);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const GENERATED: &str = "#By changing the setting below to TRUE you are indicating your agreement to our EULA.\n#Mon Oct 16 10:00:00 UTC 2023\neula=false\n";

    fn world_with_eula(contents: &str) -> TempDir {
        let world = TempDir::new().unwrap();
        std::fs::write(world.path().join(EULA_FILE), contents).unwrap();
        world
    }

    fn eula_text(world: &TempDir) -> String {
        std::fs::read_to_string(world.path().join(EULA_FILE)).unwrap()
    }

    #[tokio::test]
    async fn accepting_flips_only_the_flag() {
        let world = world_with_eula(GENERATED);

        set_eula(world.path(), true).await.unwrap();

        assert_eq!(eula_text(&world), GENERATED.replace("eula=false", "eula=true"));
        assert!(read_eula(world.path()).await);
    }

    #[tokio::test]
    async fn accepting_twice_is_byte_identical() {
        let world = world_with_eula(GENERATED);

        set_eula(world.path(), true).await.unwrap();
        let after_first = std::fs::read(world.path().join(EULA_FILE)).unwrap();
        set_eula(world.path(), true).await.unwrap();
        let after_second = std::fs::read(world.path().join(EULA_FILE)).unwrap();

        assert_eq!(after_first, after_second);
    }

    #[tokio::test]
    async fn declining_rewrites_the_whole_file() {
        let world = world_with_eula("eula=true\n");

        set_eula(world.path(), false).await.unwrap();

        assert_eq!(eula_text(&world), "eula=false\n");
        assert!(!read_eula(world.path()).await);
    }

    #[tokio::test]
    async fn unexpected_format_is_a_no_op() {
        let world = world_with_eula("accepted=yes\n");

        set_eula(world.path(), true).await.unwrap();

        assert_eq!(eula_text(&world), "accepted=yes\n");
    }

    #[tokio::test]
    async fn missing_file_cannot_be_set_and_reads_as_declined() {
        let world = TempDir::new().unwrap();

        let error = set_eula(world.path(), true).await.unwrap_err();
        assert!(matches!(error, ProvisionError::SettingsIo { .. }));
        assert!(!read_eula(world.path()).await);
    }
}
