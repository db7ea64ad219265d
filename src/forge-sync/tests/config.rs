use std::path::PathBuf;

use forge_sync::{ConfigError, SyncConfig, SyncKind, UpstreamSource};

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/sync.toml")
}

fn load_fixture() -> SyncConfig {
    temp_env::with_vars(
        [
            ("FORGE_SYNC_TESTING", None::<&str>),
            ("FORGE_SYNC_TRACKER_USERNAME", None),
            ("FORGE_SYNC_TRACKER_TOKEN", None),
        ],
        || SyncConfig::load(&fixture()).unwrap(),
    )
}

#[test]
fn load_config_from_fixture() {
    let config = load_fixture();

    assert!(!config.testing);
    assert_eq!(config.default_tracker.as_deref(), Some("main"));

    let projects: Vec<&str> = config
        .routes(UpstreamSource::Github)
        .map(|(project, _)| project)
        .collect();
    assert_eq!(projects, vec!["org/plain", "org/repo"]);

    let repo = config.route(UpstreamSource::Github, "org/repo").unwrap();
    assert!(repo.syncs(SyncKind::Issue));
    assert_eq!(repo.pr_updates.link_transition.as_deref(), Some("In Progress"));
    assert_eq!(
        config.tracker_for(repo).unwrap().url,
        "https://issues.example.com"
    );
}

#[test]
fn routes_can_name_their_tracker() {
    let config = load_fixture();
    let plain = config.route(UpstreamSource::Github, "org/plain").unwrap();
    let tracker = config.tracker_for(plain).unwrap();

    assert!(!plain.syncs(SyncKind::Issue));
    assert_eq!(tracker.url, "https://ops.example.com/jira/");
    assert_eq!(tracker.username.as_deref(), Some("ops-bot"));
}

#[test]
fn env_fills_missing_credentials_only() {
    let config = temp_env::with_vars(
        [
            ("FORGE_SYNC_TESTING", Some("true")),
            ("FORGE_SYNC_TRACKER_USERNAME", Some("env-bot")),
            ("FORGE_SYNC_TRACKER_TOKEN", Some("env-token")),
        ],
        || SyncConfig::load(&fixture()).unwrap(),
    );

    assert!(config.testing);
    assert_eq!(config.trackers["main"].username.as_deref(), Some("env-bot"));
    assert_eq!(config.trackers["ops"].username.as_deref(), Some("ops-bot"));
    assert_eq!(config.trackers["ops"].token.as_deref(), Some("env-token"));
}

#[test]
fn unknown_tracker_reference_is_rejected() {
    let content = std::fs::read_to_string(fixture())
        .unwrap()
        .replace("tracker = \"ops\"", "tracker = \"missing\"");
    let result = SyncConfig::parse(&content, "fixture");

    assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
}
