//! Integration tests for session credential resolution

use super::*;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use mockall::mock;
use mockall::predicate::eq;
use serde_json::json;
use std::sync::Arc;
use tokio_test::assert_ok;
use url::Url;
use uma_integration::{
    AccessGrant, Challenge, ClaimHandlerRegistry, Credential, Session, UmaResult, ID_TOKEN,
    VERIFIABLE_CREDENTIAL,
};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::Mock;

mock! {
    pub Upstream {}

    #[async_trait]
    impl Session for Upstream {
        fn principal(&self) -> Option<Url>;
        fn supported_schemes(&self) -> Vec<String>;
        async fn credential(&self, capability: &str, resource: &Url) -> UmaResult<Option<Credential>>;
        fn select_thumbprint(&self, algorithms: &[String]) -> Option<String>;
    }
}

fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
}

fn webid() -> Url {
    url("https://id.example/alice#me")
}

fn grant() -> AccessGrant {
    AccessGrant::new(
        url("https://grants.example/g1"),
        url("https://vc.example"),
        Utc::now() + Duration::hours(1),
        "{\"type\":[\"VerifiableCredential\",\"SolidAccessGrant\"]}",
    )
    .with_resource(url("https://pod.example/a/b.ttl"))
    .with_recipient(webid())
    .with_mode("Read")
}

fn id_credential() -> Credential {
    Credential::new(
        "Bearer",
        url("https://idp.example"),
        "id-jwt",
        Utc::now() + Duration::hours(1),
    )
    .with_principal(Some(webid()))
    .with_proof_thumbprint(Some("jkt-alice".to_string()))
}

#[tokio::test]
async fn test_resolve_grant_for_covered_resource_only() {
    let mut upstream = MockUpstream::new();
    upstream.expect_principal().returning(|| Some(webid()));
    upstream
        .expect_credential()
        .withf(|capability, resource| {
            capability == VERIFIABLE_CREDENTIAL && resource.as_str() == "https://pod.example/c/d.ttl"
        })
        .times(1)
        .returning(|_, _| Ok(None));

    let session = client().session(Arc::new(upstream), vec![grant()], ClaimHandlerRegistry::new());

    let covered = assert_ok!(
        session
            .resolve(VERIFIABLE_CREDENTIAL, &url("https://pod.example/a/b.ttl"))
            .await
    );
    let covered = covered.expect("grant credential");
    assert!(!covered.token().is_empty());
    assert_eq!(covered.issuer().as_str(), "https://vc.example/");
    assert_eq!(covered.principal(), Some(&webid()));

    let sibling = assert_ok!(
        session
            .resolve(VERIFIABLE_CREDENTIAL, &url("https://pod.example/c/d.ttl"))
            .await
    );
    assert!(sibling.is_none());
}

#[tokio::test]
async fn test_concurrent_resolution() {
    let mut upstream = MockUpstream::new();
    upstream.expect_principal().returning(|| None);

    let session = client().session(Arc::new(upstream), vec![grant()], ClaimHandlerRegistry::new());
    let resource = url("https://pod.example/a/b.ttl");

    let lookups = (0..8).map(|_| session.resolve(VERIFIABLE_CREDENTIAL, &resource));
    let results = futures::future::join_all(lookups).await;

    assert!(results
        .into_iter()
        .all(|r| matches!(r, Ok(Some(_)))));
}

#[tokio::test]
async fn test_authenticate_upgrades_with_grant_and_caches() {
    let mock_server = setup_mock_server().await;
    mount_discovery(&mock_server, &[ID_TOKEN, VERIFIABLE_CREDENTIAL]).await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("rpt="))
        .respond_with(token_response(json!({
            "access_token": "AT2",
            "token_type": "Bearer",
            "expires_in": 300,
            "scope": "read"
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(token_response(json!({
            "access_token": "AT1",
            "token_type": "Bearer",
            "expires_in": 300
        })))
        .mount(&mock_server)
        .await;

    let mut upstream = MockUpstream::new();
    upstream.expect_principal().returning(|| Some(webid()));
    upstream
        .expect_credential()
        .withf(|capability, _| capability == ID_TOKEN)
        .returning(|_, _| Ok(Some(id_credential())));

    let session = client().session(Arc::new(upstream), vec![grant()], ClaimHandlerRegistry::new());
    let header = format!("UMA as_uri=\"{}\", ticket=\"t1\"", mock_server.uri());
    let challenge = Challenge::parse_all(&header).unwrap().remove(0);

    let credential = assert_ok!(
        session
            .authenticate(&challenge, &url("https://pod.example/a/b.ttl?rev=1"))
            .await
    );
    assert_eq!(credential.token(), "AT2");
    assert_eq!(credential.proof_thumbprint(), Some("jkt-alice"));
    assert_eq!(credential.principal(), Some(&webid()));
    assert!(!credential.is_expired());

    let requests = token_requests(&mock_server).await;
    assert_eq!(requests.len(), 2);
    assert_eq!(form_value(&requests[0], "claim_token").as_deref(), Some("id-jwt"));
    assert_eq!(
        form_value(&requests[0], "claim_token_format").as_deref(),
        Some(ID_TOKEN)
    );
    assert_eq!(form_value(&requests[1], "rpt").as_deref(), Some("AT1"));
    assert_eq!(form_value(&requests[1], "ticket").as_deref(), Some("t1"));
    assert_eq!(
        form_value(&requests[1], "claim_token_format").as_deref(),
        Some(VERIFIABLE_CREDENTIAL)
    );

    // Query variation hits the cache
    let cached = assert_ok!(
        session
            .authenticate(&challenge, &url("https://pod.example/a/b.ttl?rev=2"))
            .await
    );
    assert_eq!(cached.token(), "AT2");
    assert_eq!(token_requests(&mock_server).await.len(), 2);

    session.reset();
    assert!(session
        .from_cache(&url("https://pod.example/a/b.ttl"))
        .is_none());

    assert_ok!(
        session
            .authenticate(&challenge, &url("https://pod.example/a/b.ttl"))
            .await
    );
    assert_eq!(token_requests(&mock_server).await.len(), 4);
}

#[tokio::test]
async fn test_authenticate_without_vc_profile_keeps_first_token() {
    let mock_server = setup_mock_server().await;
    mount_discovery(&mock_server, &[ID_TOKEN]).await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(token_response(json!({"access_token": "AT1", "expires_in": 300})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut upstream = MockUpstream::new();
    upstream
        .expect_credential()
        .with(eq(ID_TOKEN), eq(url("https://pod.example/a/b.ttl")))
        .times(1)
        .returning(|_, _| Ok(Some(id_credential())));

    let session = client().session(Arc::new(upstream), vec![grant()], ClaimHandlerRegistry::new());
    let challenge = Challenge::uma(&Url::parse(&mock_server.uri()).unwrap(), "t1");

    let credential = assert_ok!(
        session
            .authenticate(&challenge, &url("https://pod.example/a/b.ttl"))
            .await
    );
    assert_eq!(credential.token(), "AT1");
}

#[tokio::test]
async fn test_invalid_challenge_is_rejected() {
    let upstream = MockUpstream::new();
    let session = client().session(Arc::new(upstream), Vec::new(), ClaimHandlerRegistry::new());

    let challenges = Challenge::parse_all("Bearer realm=\"pod\"").unwrap();
    let result = session
        .authenticate(&challenges[0], &url("https://pod.example/a"))
        .await;

    assert!(result.is_err());
    assert!(session.cache().is_empty());
}
