//! End-to-end tests for the metadata deploy pipeline
//!
//! These tests run `MetadataDeployer::deploy` against a mock org and cover:
//! - Multipart submission and status polling
//! - Component failure reporting
//! - Submission and polling failures

#![allow(clippy::unwrap_used, clippy::expect_used)]

use async_trait::async_trait;
use orgpush_common::{ApiVersion, OrgCredentials};
use orgpush_core::{
    CoreError, FailureKind, FailureStep, JobPoller, ManifestTable, MetadataDeployer,
    MetadataDocument, OrgClient, PollConfig, Sleeper,
};
use serde_json::json;
use std::time::Duration;
use wiremock::{
    matchers::{header, header_regex, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

const DEPLOY: &str = "/services/data/v61.0/metadata/deployRequest";
const DEPLOY_JOB: &str = "/services/data/v61.0/metadata/deployRequest/0Afxx0000001";

const REMOTE_SITE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<RemoteSiteSetting xmlns="http://soap.sforce.com/2006/04/metadata">
    <fullName>My Site</fullName>
    <isActive>true</isActive>
    <url>https://api.example.com</url>
</RemoteSiteSetting>"#;

struct NoSleep;

#[async_trait]
impl Sleeper for NoSleep {
    async fn sleep(&self, _duration: Duration) {}
}

fn contains(haystack: &[u8], needle: &str) -> bool {
    haystack
        .windows(needle.len())
        .any(|window| window == needle.as_bytes())
}

fn client_for(server: &MockServer) -> OrgClient {
    let creds = OrgCredentials::new(server.uri(), "test-token", ApiVersion::default()).unwrap();
    OrgClient::new(creds).unwrap()
}

fn deployer<'c>(client: &'c OrgClient, max_wait_secs: u64) -> MetadataDeployer<'c, NoSleep> {
    let config = PollConfig::new(Duration::from_secs(3), Duration::from_secs(max_wait_secs)).unwrap();
    MetadataDeployer::with_poller(
        client,
        ManifestTable::bundled().unwrap(),
        JobPoller::with_sleeper(config, NoSleep),
    )
}

async fn mount_submit(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(DEPLOY))
        .and(header("authorization", "Bearer test-token"))
        .and(header_regex("content-type", "^multipart/form-data"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "0Afxx0000001",
            "deployResult": {"id": "0Afxx0000001", "status": "Pending", "done": false}
        })))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_status(server: &MockServer, deploy_result: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(DEPLOY_JOB))
        .and(query_param("includeDetails", "true"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "deployResult": deploy_result })),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_deploy_succeeds() {
    let server = MockServer::start().await;
    mount_submit(&server).await;
    mount_status(
        &server,
        json!({"id": "0Afxx0000001", "status": "Succeeded", "done": true, "success": true,
               "numberComponentsDeployed": 1, "numberComponentErrors": 0}),
    )
    .await;

    let client = client_for(&server);
    let document = MetadataDocument::parse(REMOTE_SITE).unwrap();
    let result = deployer(&client, 300).deploy(&document).await.unwrap();

    assert!(result.success);
    assert_eq!(result.job_id.as_deref(), Some("0Afxx0000001"));
    assert_eq!(result.status, "Succeeded");
    assert_eq!(result.components_deployed, 1);
    assert!(result.failures.is_empty());
}

#[tokio::test]
async fn test_multipart_body_carries_options_and_archive() {
    let server = MockServer::start().await;
    mount_submit(&server).await;
    mount_status(
        &server,
        json!({"id": "0Afxx0000001", "status": "Succeeded", "done": true, "success": true}),
    )
    .await;

    let client = client_for(&server);
    let document = MetadataDocument::parse(REMOTE_SITE).unwrap();
    deployer(&client, 300).deploy(&document).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let body = &requests[0].body;
    assert!(contains(body, "name=\"json\""));
    assert!(contains(body, "\"rollbackOnError\":true"));
    assert!(contains(body, "\"testLevel\":\"NoTestRun\""));
    assert!(contains(body, "\"singlePackage\":true"));
    assert!(contains(body, "name=\"file\"; filename=\"metadata.zip\""));
    assert!(contains(body, "application/zip"));
}

#[tokio::test]
async fn test_deploy_with_component_failure() {
    let server = MockServer::start().await;
    mount_submit(&server).await;
    mount_status(
        &server,
        json!({
            "id": "0Afxx0000001", "status": "Failed", "done": true, "success": false,
            "numberComponentErrors": 1,
            "details": {
                "componentFailures": [{"fullName": "X", "problem": "required field missing"}]
            }
        }),
    )
    .await;

    let client = client_for(&server);
    let document = MetadataDocument::parse(REMOTE_SITE).unwrap();
    let result = deployer(&client, 300).deploy(&document).await.unwrap();

    assert!(!result.success);
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].identifier, "X");
    assert_eq!(result.failures[0].problem, "required field missing");
    assert!(result.error.is_none());
}

#[tokio::test]
async fn test_deploy_keeps_polling_until_done() {
    let server = MockServer::start().await;
    mount_submit(&server).await;

    Mock::given(method("GET"))
        .and(path(DEPLOY_JOB))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "deployResult": {"id": "0Afxx0000001", "status": "InProgress", "done": false}
        })))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mount_status(
        &server,
        json!({"id": "0Afxx0000001", "status": "Succeeded", "done": true, "success": true,
               "numberComponentsDeployed": 1}),
    )
    .await;

    let client = client_for(&server);
    let document = MetadataDocument::parse(REMOTE_SITE).unwrap();
    let result = deployer(&client, 300).deploy(&document).await.unwrap();

    assert!(result.success);
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 4);
}

#[tokio::test]
async fn test_rejected_submission_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(DEPLOY))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!([
            {"errorCode": "INVALID_SESSION_ID", "message": "Session expired or invalid"}
        ])))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let document = MetadataDocument::parse(REMOTE_SITE).unwrap();
    let result = deployer(&client, 300).deploy(&document).await.unwrap();

    assert!(!result.success);
    assert!(result.job_id.is_none());
    let error = result.error.unwrap();
    assert_eq!(error.step, FailureStep::SubmitDeploy);
    assert_eq!(error.kind, FailureKind::Submission);
    assert!(error.message.contains("401"));
    assert!(error.message.contains("INVALID_SESSION_ID"));
}

#[tokio::test]
async fn test_deploy_timeout_is_reported() {
    let server = MockServer::start().await;
    mount_submit(&server).await;
    mount_status(
        &server,
        json!({"id": "0Afxx0000001", "status": "InProgress", "done": false}),
    )
    .await;

    let client = client_for(&server);
    let document = MetadataDocument::parse(REMOTE_SITE).unwrap();
    let result = deployer(&client, 6).deploy(&document).await.unwrap();

    assert_eq!(result.job_id.as_deref(), Some("0Afxx0000001"));
    let error = result.error.unwrap();
    assert_eq!(error.step, FailureStep::PollStatus);
    assert_eq!(error.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn test_unknown_type_fails_before_any_request() {
    let server = MockServer::start().await;
    let client = client_for(&server);
    let document = MetadataDocument::parse("<Gizmo><fullName>g</fullName></Gizmo>").unwrap();

    let err = deployer(&client, 300).deploy(&document).await.unwrap_err();

    assert!(matches!(err, CoreError::Configuration(_)));
    assert_eq!(server.received_requests().await.unwrap().len(), 0);
}
