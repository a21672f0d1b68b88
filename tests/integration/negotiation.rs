//! Integration tests for the claims-gathering loop

use super::*;
use serde_json::json;
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};
use url::Url;
use uma_integration::negotiation::create_mock_claim_handler;
use uma_integration::{
    ClaimHandlerRegistry, NegotiationError, TokenRequest, UmaError, UnknownErrorPolicy,
};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, ResponseTemplate};

fn id_token_requirement() -> serde_json::Value {
    json!({
        "claim_token_format": ["idtoken-format"],
        "issuer": ["https://idp.example"],
        "claim_type": "idtoken"
    })
}

fn endpoint(server: &wiremock::MockServer) -> Url {
    Url::parse(&format!("{}/token", server.uri())).unwrap()
}

#[tokio::test]
async fn test_need_info_round_then_token() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("ticket=t2"))
        .and(body_string_contains("claim_token_format=idtoken-format"))
        .respond_with(token_response(json!({
            "access_token": "AT1",
            "token_type": "Bearer",
            "expires_in": 300
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("ticket=t1"))
        .respond_with(need_info_response("t2", id_token_requirement()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let handler = create_mock_claim_handler("idtoken-format", "https://idp.example", "idtoken", "jwt");
    let registry = ClaimHandlerRegistry::new().with_handler(handler.clone());

    let response = client()
        .negotiate(&endpoint(&mock_server), TokenRequest::new("t1"), &registry)
        .await;

    let response = assert_ok!(response);
    assert_eq!(response.access_token, "AT1");
    assert_eq!(handler.gather_count(), 1);

    let requests = token_requests(&mock_server).await;
    assert_eq!(requests.len(), 2);
    assert_eq!(
        form_value(&requests[0], "grant_type").as_deref(),
        Some("urn:ietf:params:oauth:grant-type:uma-ticket")
    );
    assert_eq!(form_value(&requests[1], "claim_token").as_deref(), Some("jwt"));
}

#[tokio::test]
async fn test_no_compatible_handler_denies_after_one_call() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(need_info_response("t2", id_token_requirement()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let registry = ClaimHandlerRegistry::new().with_handler(create_mock_claim_handler(
        "vc-format",
        "https://vc.example",
        "vc",
        "vc-token",
    ));

    let result = client()
        .negotiate(&endpoint(&mock_server), TokenRequest::new("t1"), &registry)
        .await;

    assert!(matches!(
        result,
        Err(UmaError::Negotiation(NegotiationError::RequestDenied { .. }))
    ));
}

#[tokio::test]
async fn test_iteration_limit() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(need_info_response("again", id_token_requirement()))
        .expect(3)
        .mount(&mock_server)
        .await;

    let registry = ClaimHandlerRegistry::new().with_handler(create_mock_claim_handler(
        "idtoken-format",
        "https://idp.example",
        "idtoken",
        "jwt",
    ));

    let result = client()
        .negotiate_with_limit(&endpoint(&mock_server), TokenRequest::new("t1"), &registry, 3)
        .await;

    match assert_err!(result) {
        UmaError::Negotiation(NegotiationError::IterationLimitExceeded { max_iterations }) => {
            assert_eq!(max_iterations, 3)
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_terminal_error_codes() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_scope",
            "error_description": "unknown scope 'admin'"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let request = TokenRequest::new("t1").with_scopes(vec!["admin".to_string()]);
    let result = client()
        .negotiate(&endpoint(&mock_server), request, &ClaimHandlerRegistry::new())
        .await;

    match assert_err!(result) {
        UmaError::Negotiation(NegotiationError::InvalidScope { message }) => {
            assert_eq!(message, "unknown scope 'admin'")
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_fail_fast_on_unrecognized_code() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "server_error",
            "ticket": "t2"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = uma_config()
        .unknown_error_policy(UnknownErrorPolicy::FailFast)
        .build()
        .unwrap();
    let client = uma_integration::UmaClient::new(config).unwrap();

    let error = assert_err!(
        client
            .negotiate(&endpoint(&mock_server), TokenRequest::new("t1"), &ClaimHandlerRegistry::new())
            .await
    );
    assert_eq!(error.status(), Some(400));
}

#[tokio::test]
async fn test_concurrent_negotiations_are_independent() {
    let mock_server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(token_response(json!({"access_token": "AT", "expires_in": 60})))
        .expect(4)
        .mount(&mock_server)
        .await;

    let client = Arc::new(client());
    let registry = Arc::new(ClaimHandlerRegistry::new());
    let endpoint = endpoint(&mock_server);

    let calls = (0..4).map(|i| {
        let client = client.clone();
        let registry = registry.clone();
        let endpoint = endpoint.clone();
        async move {
            client
                .negotiate(&endpoint, TokenRequest::new(format!("t{}", i)), registry.as_ref())
                .await
        }
    });

    let results = futures::future::join_all(calls).await;
    assert!(results.iter().all(|r| r.is_ok()));
}
