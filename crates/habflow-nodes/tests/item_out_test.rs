#![allow(clippy::unwrap_used)]
// Integration tests for the command sink using wiremock.

use serde_json::{Value, json};
use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use habflow_api::ConnectionDescriptor;
use habflow_nodes::{ItemOutConfig, ItemOutNode, NodeError, Severity};

// ── Helpers ─────────────────────────────────────────────────────────

fn descriptor_for(server: &MockServer) -> ConnectionDescriptor {
    let addr = server.address();
    ConnectionDescriptor::new(addr.ip().to_string(), addr.port())
}

fn node_for(server: &MockServer, item: &str, command: &str) -> ItemOutNode {
    let mut config = ItemOutConfig::new(descriptor_for(server), item);
    config.command = command.to_owned();
    ItemOutNode::new(config).unwrap()
}

// ── Command delivery ────────────────────────────────────────────────

#[tokio::test]
async fn test_posts_normalized_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/items/Lamp"))
        .and(header("content-type", "text/plain"))
        .and(body_string("ON"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let node = node_for(&server, "Lamp", "");
    let signal = node.handle_input(&json!(1)).await;

    assert_eq!(signal.severity, Severity::SuccessOff);
    assert_eq!(signal.text, "OK");
    server.verify().await;
}

#[tokio::test]
async fn test_override_beats_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/items/Lamp"))
        .and(body_string("OFF"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let node = node_for(&server, "Lamp", "off");
    let sent = node.send(&json!("on")).await.unwrap();

    assert_eq!(sent, "OFF");
    server.verify().await;
}

#[tokio::test]
async fn test_setpoints_pass_through() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/items/Thermostat"))
        .and(body_string("21.5"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let node = node_for(&server, "Thermostat", "");
    node.send(&json!(21.5)).await.unwrap();

    server.verify().await;
}

// ── Failure paths ───────────────────────────────────────────────────

#[tokio::test]
async fn test_no_command_sends_nothing() {
    let server = MockServer::start().await;
    // No mocks mounted: any request would 404 and fail verify.

    let node = node_for(&server, "Lamp", "");

    let result = node.send(&Value::Null).await;
    assert!(matches!(result, Err(NodeError::NoCommand)));

    let signal = node.handle_input(&Value::Null).await;
    assert_eq!(signal.severity, Severity::Error);
    assert_eq!(signal.text, "no command specified");
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_rejected_command_reports_the_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/items/Lamp"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad command"))
        .mount(&server)
        .await;

    let node = node_for(&server, "Lamp", "");
    let signal = node.handle_input(&json!("on")).await;

    assert_eq!(signal.severity, Severity::Error);
    assert!(
        signal.text.contains("400"),
        "expected the status in: {}",
        signal.text
    );
}

#[tokio::test]
async fn test_unreachable_hub_reports_transport_failure() {
    let server = MockServer::start().await;
    let node = node_for(&server, "Lamp", "");
    drop(server);

    let signal = node.handle_input(&json!("on")).await;

    assert_eq!(signal.severity, Severity::Error);
    // The sink absorbed the failure; its status channel carries detail.
    assert!(!signal.text.is_empty());
}

// ── Validation ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_blank_item_name_is_rejected() {
    let server = MockServer::start().await;
    let config = ItemOutConfig::new(descriptor_for(&server), "  ");

    assert!(matches!(
        ItemOutNode::new(config),
        Err(NodeError::Config { .. })
    ));
}
