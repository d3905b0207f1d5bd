//! Integration tests for `WhatsAppClient::send_template`.
//!
//! Uses `wiremock` to stand up a local HTTP server for each test so no
//! real network traffic is made. Covers the template payload contract,
//! send-time phone normalization, and every error variant.

use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use restock_alerts_core::PhoneNumber;
use restock_alerts_server::config::WhatsAppConfig;
use restock_alerts_server::services::whatsapp::{
    TEMPLATE_BACK_IN_STOCK, TEMPLATE_SUBSCRIPTION_CONFIRMED, WhatsAppClient, WhatsAppError,
};

const PHONE_NUMBER_ID: &str = "109999999999999";

/// Builds a client pointed at the mock server.
fn test_client(api_base: &str) -> WhatsAppClient {
    let config = WhatsAppConfig {
        phone_number_id: Some(PHONE_NUMBER_ID.to_string()),
        access_token: Some(SecretString::from("test-token")),
        api_base: api_base.to_string(),
    };
    WhatsAppClient::new(&config).expect("failed to build test WhatsAppClient")
}

fn phone(s: &str) -> PhoneNumber {
    PhoneNumber::parse(s).expect("valid phone number")
}

#[tokio::test]
async fn send_template_posts_template_payload_with_bearer_auth() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/{PHONE_NUMBER_ID}/messages")))
        .and(header("Authorization", "Bearer test-token"))
        .and(body_partial_json(json!({
            "messaging_product": "whatsapp",
            "type": "template",
            "template": {
                "name": TEMPLATE_BACK_IN_STOCK,
                "language": { "code": "en" }
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({
            "messages": [{"id": "wamid.test"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let result = client
        .send_template(&phone("15550100"), TEMPLATE_BACK_IN_STOCK)
        .await;

    assert!(result.is_ok(), "expected Ok, got: {result:?}");
}

#[tokio::test]
async fn send_template_normalizes_recipient_at_send_time() {
    let server = MockServer::start().await;

    // Stored with `+` and spaces; the wire form must be bare digits.
    Mock::given(method("POST"))
        .and(path(format!("/{PHONE_NUMBER_ID}/messages")))
        .and(body_partial_json(json!({"to": "15550100"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({"messages": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let result = client
        .send_template(&phone("+1 555 0100"), TEMPLATE_SUBSCRIPTION_CONFIRMED)
        .await;

    assert!(result.is_ok(), "expected Ok, got: {result:?}");
}

#[tokio::test]
async fn send_template_maps_provider_rejection_to_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_json(&json!({
            "error": {"message": "Invalid OAuth access token", "code": 190}
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let result = client
        .send_template(&phone("15550100"), TEMPLATE_BACK_IN_STOCK)
        .await;

    match result {
        Err(WhatsAppError::Api { status, message }) => {
            assert_eq!(status, 401);
            assert!(message.contains("Invalid OAuth access token"));
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn send_template_surfaces_unknown_template_rejection() {
    let server = MockServer::start().await;

    // The production failure mode: template name not in the approved
    // registry; every send 404s provider-side.
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(404).set_body_json(&json!({
            "error": {"message": "Template name does not exist in the translation"}
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let result = client
        .send_template(&phone("15550100"), "misspelled_template")
        .await;

    match result {
        Err(WhatsAppError::Api { status, message }) => {
            assert_eq!(status, 404);
            assert!(message.contains("Template name"));
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn send_template_without_credentials_fails_without_io() {
    // No mock server: a credential-less send must not attempt a request.
    let config = WhatsAppConfig {
        phone_number_id: None,
        access_token: None,
        api_base: "http://127.0.0.1:9".to_string(),
    };
    let client = WhatsAppClient::new(&config).expect("client builds without credentials");

    let result = client
        .send_template(&phone("15550100"), TEMPLATE_BACK_IN_STOCK)
        .await;

    assert!(matches!(result, Err(WhatsAppError::MissingCredentials)));
}

#[test]
fn template_names_match_the_approved_registry() {
    // These strings are a deployment contract with Meta's template
    // registry; changing them silently breaks every send.
    assert_eq!(TEMPLATE_SUBSCRIPTION_CONFIRMED, "subscription_confirmed");
    assert_eq!(TEMPLATE_BACK_IN_STOCK, "item_back_in_stock");
}
