//! Integration tests for UMA discovery

use super::*;
use tokio_test::assert_ok;
use url::Url;
use uma_integration::{ConfigurationError, UmaError, ID_TOKEN, VERIFIABLE_CREDENTIAL};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_discovery_document_is_fetched_once() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/.well-known/uma2-configuration"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "token_endpoint": format!("{}/token", mock_server.uri()),
            "uma_profiles_supported": [ID_TOKEN, VERIFIABLE_CREDENTIAL]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client();
    let as_uri = Url::parse(&mock_server.uri()).unwrap();

    let metadata = assert_ok!(client.metadata(&as_uri).await);
    assert!(metadata.supports_id_token());
    assert!(metadata.supports_verifiable_credential());
    assert!(metadata.jwks_uri.is_none());
    assert_eq!(
        metadata.token_endpoint.as_str(),
        format!("{}/token", mock_server.uri())
    );

    assert_ok!(client.metadata(&as_uri).await);
}

#[tokio::test]
async fn test_discovery_profiles() {
    let mock_server = setup_mock_server().await;
    mount_discovery(&mock_server, &[ID_TOKEN]).await;

    let metadata = assert_ok!(
        client()
            .metadata(&Url::parse(&mock_server.uri()).unwrap())
            .await
    );

    assert!(metadata.supports_id_token());
    assert!(!metadata.supports_verifiable_credential());
    assert_eq!(
        metadata.select_dpop_algorithm(&["RS256".to_string(), "ES256".to_string()]),
        Some("ES256")
    );
}

#[tokio::test]
async fn test_discovery_not_found() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("GET"))
        .and(path("/.well-known/uma2-configuration"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let result = client()
        .metadata(&Url::parse(&mock_server.uri()).unwrap())
        .await;

    assert!(matches!(
        result,
        Err(UmaError::Configuration(ConfigurationError::DiscoveryFailed { .. }))
    ));
}
