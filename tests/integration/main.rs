//! Integration tests using WireMock
//!
//! These tests drive the UMA client against a mock authorization server,
//! covering discovery, the claims-gathering loop and session credential
//! resolution over real HTTP.

mod discovery;
mod negotiation;
mod session;

use serde_json::json;
use url::form_urlencoded;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use uma_integration::{uma_config, UmaClient};

/// Helper to start a mock authorization server
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Helper to create a client with default settings
pub fn client() -> UmaClient {
    UmaClient::new(uma_config().build().unwrap()).expect("Failed to build client")
}

/// Helper to mount a discovery document advertising `profiles`
pub async fn mount_discovery(server: &MockServer, profiles: &[&str]) {
    Mock::given(method("GET"))
        .and(path("/.well-known/uma2-configuration"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "issuer": server.uri(),
            "token_endpoint": format!("{}/token", server.uri()),
            "jwks_uri": format!("{}/jwks", server.uri()),
            "dpop_signing_alg_values_supported": ["ES256"],
            "grant_types_supported": ["urn:ietf:params:oauth:grant-type:uma-ticket"],
            "uma_profiles_supported": profiles,
        })))
        .mount(server)
        .await;
}

/// Helper to create a need_info response template
pub fn need_info_response(ticket: &str, requirement: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(403).set_body_json(json!({
        "error": "need_info",
        "ticket": ticket,
        "required_claims": [requirement],
    }))
}

/// Helper to create token response templates
pub fn token_response(body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(body)
}

/// Token endpoint requests received so far
pub async fn token_requests(server: &MockServer) -> Vec<Request> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.url.path() == "/token")
        .collect()
}

/// Value of a form field in a request body
pub fn form_value(request: &Request, key: &str) -> Option<String> {
    form_urlencoded::parse(&request.body)
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}
