
// Include tests
#[cfg(test)]
mod tests {
    use crate::test_support::{manifest_json, FakeFetcher, FakeInitializer};
    use crate::*;
    use serde_json::json;
    use sha1::{Digest, Sha1};
    use std::sync::Arc;
    use tempfile::TempDir;

    const MANIFEST_URL: &str = "http://fixture/mc/game/version_manifest.json";
    const DETAIL_URL: &str = "http://fixture/v1/packages/1.20.1.json";
    const ARTIFACT_URL: &str = "http://fixture/objects/server.jar";
    const ARTIFACT: &[u8] = b"PK\x03\x04 fixture server artifact";

    fn fixture_fetcher() -> FakeFetcher {
        let detail = json!({
            "id": "1.20.1",
            "downloads": {
                "server": {
                    "sha1": hex::encode(Sha1::digest(ARTIFACT)),
                    "size": ARTIFACT.len(),
                    "url": ARTIFACT_URL,
                }
            }
        });

        FakeFetcher::new()
            .with_body(
                MANIFEST_URL,
                manifest_json(&[
                    ("1.20.1", "release", DETAIL_URL),
                    ("23w31a", "snapshot", "http://fixture/v1/packages/23w31a.json"),
                ]),
            )
            .with_body(DETAIL_URL, detail.to_string())
            .with_body(ARTIFACT_URL, ARTIFACT)
    }

    struct Fixture {
        _root: TempDir,
        config: EngineConfig,
        fetcher: Arc<FakeFetcher>,
        initializer: Arc<FakeInitializer>,
        provisioner: Provisioner,
    }

    fn fixture_with(initializer: FakeInitializer) -> Fixture {
        let root = TempDir::new().unwrap();
        let config = EngineConfig {
            manifest_url: MANIFEST_URL.to_string(),
            ..EngineConfig::with_data_dir(root.path())
        };
        let fetcher = Arc::new(fixture_fetcher());
        let initializer = Arc::new(initializer);
        let provisioner = create_provisioner_with(&config, fetcher.clone(), initializer.clone());

        Fixture {
            _root: root,
            config,
            fetcher,
            initializer,
            provisioner,
        }
    }

    fn overrides(value: serde_json::Value) -> Overrides {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_provision_world_end_to_end() {
        let fixture = fixture_with(FakeInitializer::new());
        let request = ProvisionRequest::new("1.20.1", "MyServer")
            .accept_eula(true)
            .with_overrides(overrides(json!({"difficulty": "hard"})));

        let world = fixture
            .provisioner
            .provision_world(request)
            .await
            .expect("provisioning succeeds");

        let instance = &world.instance;
        assert_eq!(instance.name, "MyServer");
        assert_eq!(instance.artifact_version, "1.20.1");
        assert!(instance.eula_accepted);
        assert_eq!(instance.id.get_version_num(), 4);
        assert_eq!(instance.path, fixture.config.worlds_dir.join(instance.id.to_string()));

        let expected = ServerProperties {
            difficulty: "hard".to_string(),
            ..ServerProperties::default()
        };
        assert_eq!(world.settings, expected);

        let summary = fixture.provisioner.describe_world(&instance.path).await.unwrap();
        assert_eq!(summary.settings, expected);
        assert!(summary.eula_accepted);

        assert_eq!(std::fs::read(instance.path.join("1.20.1.jar")).unwrap(), ARTIFACT);
        assert_eq!(std::fs::read(fixture.config.cache_dir.join("1.20.1.jar")).unwrap(), ARTIFACT);
        assert_eq!(fixture.initializer.calls(), 1);
    }

    #[tokio::test]
    async fn test_second_world_reuses_cached_artifact() {
        let fixture = fixture_with(FakeInitializer::new());

        let first = fixture
            .provisioner
            .provision_world(ProvisionRequest::new("1.20.1", "One"))
            .await
            .unwrap();
        let second = fixture
            .provisioner
            .provision_world(ProvisionRequest::new("1.20.1", "Two"))
            .await
            .unwrap();

        assert_ne!(first.instance.id, second.instance.id);
        assert_ne!(first.instance.path, second.instance.path);
        assert_eq!(fixture.fetcher.hits(ARTIFACT_URL), 1);
        assert_eq!(fixture.fetcher.hits(MANIFEST_URL), 2);
        assert!(!fixture.provisioner.get_eula_status(&first.instance.path).await);
    }

    #[tokio::test]
    async fn test_unknown_version_touches_nothing() {
        let fixture = fixture_with(FakeInitializer::new());

        let error = fixture
            .provisioner
            .provision_world(ProvisionRequest::new("1.20", "Nope"))
            .await
            .unwrap_err();

        assert!(matches!(error, ProvisionError::NotFound { ref version_id } if version_id == "1.20"));
        assert_eq!(fixture.fetcher.hits(DETAIL_URL), 0);
        assert!(!fixture.config.cache_dir.exists());
        assert_eq!(fixture.initializer.calls(), 0);
    }

    #[tokio::test]
    async fn test_failed_first_run_leaves_no_world() {
        let fixture = fixture_with(FakeInitializer::failing());

        let error = fixture
            .provisioner
            .provision_world(ProvisionRequest::new("1.20.1", "Broken"))
            .await
            .unwrap_err();

        assert!(matches!(
            error,
            ProvisionError::Bootstrap { stage: BootstrapStage::FirstRunExecuted, .. }
        ));
        let leftovers = std::fs::read_dir(&fixture.config.worlds_dir).unwrap().count();
        assert_eq!(leftovers, 0);
        // The artifact stays cached for the next attempt.
        assert!(fixture.config.cache_dir.join("1.20.1.jar").is_file());
    }

    #[tokio::test]
    async fn test_invalid_override_is_rejected_before_any_work() {
        let fixture = fixture_with(FakeInitializer::new());
        let request = ProvisionRequest::new("1.20.1", "Bad")
            .with_overrides(overrides(json!({"max-players": "not-a-number"})));

        let error = fixture.provisioner.provision_world(request).await.unwrap_err();

        assert!(matches!(error, ProvisionError::InvalidOverride { .. }));
        assert_eq!(error.key(), Some("max-players"));
        assert_eq!(fixture.fetcher.hits(MANIFEST_URL), 0);
        assert_eq!(fixture.fetcher.hits(ARTIFACT_URL), 0);
        assert_eq!(fixture.initializer.calls(), 0);
        assert!(!fixture.config.cache_dir.exists());
        assert!(!fixture.config.worlds_dir.exists());
    }

    #[tokio::test]
    async fn test_settings_operations_on_existing_world() {
        let fixture = fixture_with(FakeInitializer::new());
        let world = fixture
            .provisioner
            .provision_world(ProvisionRequest::new("1.20.1", "Edit"))
            .await
            .unwrap();
        let path = &world.instance.path;

        let updated = fixture
            .provisioner
            .update_settings(path, &overrides(json!({"max-players": 5, "motd": "Welcome"})))
            .await
            .unwrap();
        assert_eq!(updated.max_players, 5);
        assert_eq!(updated.motd, "Welcome");
        assert_eq!(fixture.provisioner.get_settings(path).await.unwrap(), updated);

        fixture.provisioner.set_eula(path, true).await.unwrap();
        assert!(fixture.provisioner.get_eula_status(path).await);
        assert_eq!(fixture.provisioner.default_settings(), ServerProperties::default());
    }
}
