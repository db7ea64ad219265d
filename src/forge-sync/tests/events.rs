use std::path::PathBuf;

use forge_sync::{
    parse_event, IssueStatus, JiraConnector, PrEvent, Runner, SyncConfig, UpstreamEvent,
};
use octocrab::Octocrab;

fn fixtures_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn read_event(name: &str) -> Vec<u8> {
    std::fs::read(fixtures_root().join("events").join(name)).unwrap()
}

fn runner() -> Runner<JiraConnector> {
    let content = std::fs::read_to_string(fixtures_root().join("sync.toml")).unwrap();
    let config = SyncConfig::parse(&content, "fixture").unwrap();
    Runner::with_connector(config, Octocrab::builder().build().unwrap(), JiraConnector)
}

#[test]
fn parse_merged_pull_request_fixture() {
    let event = parse_event(&read_event("pull_request_merged.json"))
        .unwrap()
        .unwrap();

    let UpstreamEvent::PullRequest {
        project,
        pull_request,
        event,
    } = event
    else {
        panic!("expected a pull request event");
    };

    assert_eq!(project, "org/repo");
    assert_eq!(event, PrEvent::Merged);
    assert_eq!(pull_request.number, 7);
    assert_eq!(pull_request.body.as_deref(), Some("Fixes FACTORY-12"));
    assert_eq!(pull_request.milestone.as_deref(), Some("1.2"));
    assert_eq!(pull_request.assignees[0].login, "hubot");
}

#[test]
fn parse_issue_fixture() {
    let event = parse_event(&read_event("issue_opened.json")).unwrap().unwrap();

    let UpstreamEvent::Issue { project, issue } = event else {
        panic!("expected an issue event");
    };

    assert_eq!(project, "org/plain");
    assert_eq!(issue.id, 9001);
    assert_eq!(issue.state, IssueStatus::Open);
}

#[test]
fn ping_is_ignored() {
    assert_eq!(parse_event(&read_event("ping.json")).unwrap(), None);
}

#[tokio::test]
async fn runner_ignores_ping() {
    let summary = runner().handle_event(&read_event("ping.json")).await.unwrap();

    assert_eq!(summary.items_processed, 0);
    assert!(summary.all_success());
}

#[tokio::test]
async fn runner_ignores_kinds_the_route_does_not_sync() {
    // org/plain only syncs pull requests.
    let summary = runner()
        .handle_event(&read_event("issue_opened.json"))
        .await
        .unwrap();

    assert_eq!(summary.items_processed, 0);
}

#[tokio::test]
async fn runner_rejects_garbage() {
    let result = runner().handle_event(b"{ not json").await;
    assert!(result.is_err());
}
