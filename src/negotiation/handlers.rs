//! Claim Gathering Handlers
//!
//! Handlers advertise the claim they can produce; the registry picks the
//! first one compatible with a `need_info` requirement.

use async_trait::async_trait;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use url::Url;

use crate::error::{NegotiationError, UmaError, UmaResult};
use crate::session::Session;
use crate::types::{ClaimToken, NeedInfo, RequiredClaims};

/// A source of one kind of claim token.
#[async_trait]
pub trait ClaimGatheringHandler: Send + Sync {
    /// Claim token format this handler produces.
    fn claim_token_format(&self) -> &str;

    /// Issuer of the claims this handler produces.
    fn issuer(&self) -> &str;

    /// Claim type this handler produces.
    fn claim_type(&self) -> &str;

    /// Produce a claim token.
    async fn gather(&self) -> UmaResult<ClaimToken>;
}

/// Check whether a handler can satisfy a requirement.
///
/// Empty format and issuer sets accept anything. The claim type must be
/// present and equal; there is no wildcard claim type.
pub fn is_compatible(handler: &dyn ClaimGatheringHandler, requirement: &RequiredClaims) -> bool {
    let formats = requirement.claim_token_formats();
    if !formats.is_empty() && !formats.iter().any(|f| *f == handler.claim_token_format()) {
        return false;
    }

    let issuers = requirement.issuers();
    if !issuers.is_empty() && !issuers.iter().any(|i| *i == handler.issuer()) {
        return false;
    }

    requirement.claim_type() == Some(handler.claim_type())
}

/// Resolves a `need_info` response into the next claim token.
#[async_trait]
pub trait ClaimResolver: Send + Sync {
    /// `Ok(None)` means nothing can satisfy the server.
    async fn resolve(&self, need_info: &NeedInfo) -> UmaResult<Option<ClaimToken>>;
}

/// Ordered set of claim gathering handlers.
#[derive(Clone, Default)]
pub struct ClaimHandlerRegistry {
    handlers: Vec<Arc<dyn ClaimGatheringHandler>>,
}

impl ClaimHandlerRegistry {
    /// Create empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. Earlier registrations win ties.
    pub fn register(&mut self, handler: Arc<dyn ClaimGatheringHandler>) -> &mut Self {
        self.handlers.push(handler);
        self
    }

    /// Builder-style registration.
    pub fn with_handler(mut self, handler: Arc<dyn ClaimGatheringHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// First handler compatible with any requirement, requirements taken in
    /// server order and handlers in registration order.
    pub fn find_handler(&self, need_info: &NeedInfo) -> Option<&Arc<dyn ClaimGatheringHandler>> {
        need_info.required_claims().iter().find_map(|requirement| {
            self.handlers
                .iter()
                .find(|&handler| is_compatible(&**handler, requirement))
        })
    }
}

#[async_trait]
impl ClaimResolver for ClaimHandlerRegistry {
    async fn resolve(&self, need_info: &NeedInfo) -> UmaResult<Option<ClaimToken>> {
        match self.find_handler(need_info) {
            Some(handler) => {
                tracing::debug!(
                    claim_type = handler.claim_type(),
                    claim_token_format = handler.claim_token_format(),
                    "Gathering claim"
                );
                handler.gather().await.map(Some)
            }
            None => Ok(None),
        }
    }
}

/// Resolver built from a closure.
pub struct FnClaimResolver<F, Fut> {
    f: F,
    _marker: PhantomData<fn() -> Fut>,
}

/// Wrap a closure as a [`ClaimResolver`].
pub fn claim_resolver_fn<F, Fut>(f: F) -> FnClaimResolver<F, Fut>
where
    F: Fn(NeedInfo) -> Fut + Send + Sync,
    Fut: Future<Output = UmaResult<Option<ClaimToken>>> + Send + 'static,
{
    FnClaimResolver {
        f,
        _marker: PhantomData,
    }
}

#[async_trait]
impl<F, Fut> ClaimResolver for FnClaimResolver<F, Fut>
where
    F: Fn(NeedInfo) -> Fut + Send + Sync,
    Fut: Future<Output = UmaResult<Option<ClaimToken>>> + Send + 'static,
{
    async fn resolve(&self, need_info: &NeedInfo) -> UmaResult<Option<ClaimToken>> {
        (self.f)(need_info.clone()).await
    }
}

/// Handler returning a fixed token, such as a pre-obtained ID token.
pub struct StaticClaimHandler {
    claim_type: String,
    issuer: String,
    token: ClaimToken,
}

impl StaticClaimHandler {
    pub fn new(claim_type: impl Into<String>, issuer: impl Into<String>, token: ClaimToken) -> Self {
        Self {
            claim_type: claim_type.into(),
            issuer: issuer.into(),
            token,
        }
    }
}

#[async_trait]
impl ClaimGatheringHandler for StaticClaimHandler {
    fn claim_token_format(&self) -> &str {
        self.token.format()
    }

    fn issuer(&self) -> &str {
        &self.issuer
    }

    fn claim_type(&self) -> &str {
        &self.claim_type
    }

    async fn gather(&self) -> UmaResult<ClaimToken> {
        Ok(self.token.clone())
    }
}

/// Handler that gathers a credential from an upstream session.
///
/// The capability URI doubles as the claim token format.
pub struct SessionClaimHandler {
    session: Arc<dyn Session>,
    capability: String,
    claim_type: String,
    issuer: String,
    resource: Url,
}

impl SessionClaimHandler {
    pub fn new(
        session: Arc<dyn Session>,
        capability: impl Into<String>,
        claim_type: impl Into<String>,
        issuer: impl Into<String>,
        resource: Url,
    ) -> Self {
        Self {
            session,
            capability: capability.into(),
            claim_type: claim_type.into(),
            issuer: issuer.into(),
            resource,
        }
    }
}

#[async_trait]
impl ClaimGatheringHandler for SessionClaimHandler {
    fn claim_token_format(&self) -> &str {
        &self.capability
    }

    fn issuer(&self) -> &str {
        &self.issuer
    }

    fn claim_type(&self) -> &str {
        &self.claim_type
    }

    async fn gather(&self) -> UmaResult<ClaimToken> {
        let credential = self
            .session
            .credential(&self.capability, &self.resource)
            .await?
            .ok_or_else(|| {
                UmaError::Negotiation(NegotiationError::ClaimUnavailable {
                    claim_type: self.claim_type.clone(),
                    message: format!("session holds no {} credential", self.capability),
                })
            })?;

        Ok(ClaimToken::new(credential.token(), self.capability.clone()))
    }
}

/// Mock claim handler for testing.
pub struct MockClaimHandler {
    format: String,
    issuer: String,
    claim_type: String,
    token: String,
    gather_count: AtomicUsize,
}

impl MockClaimHandler {
    /// Create new mock handler.
    pub fn new(
        format: impl Into<String>,
        issuer: impl Into<String>,
        claim_type: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            format: format.into(),
            issuer: issuer.into(),
            claim_type: claim_type.into(),
            token: token.into(),
            gather_count: AtomicUsize::new(0),
        }
    }

    /// Number of `gather()` calls so far.
    pub fn gather_count(&self) -> usize {
        self.gather_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClaimGatheringHandler for MockClaimHandler {
    fn claim_token_format(&self) -> &str {
        &self.format
    }

    fn issuer(&self) -> &str {
        &self.issuer
    }

    fn claim_type(&self) -> &str {
        &self.claim_type
    }

    async fn gather(&self) -> UmaResult<ClaimToken> {
        self.gather_count.fetch_add(1, Ordering::SeqCst);
        Ok(ClaimToken::new(self.token.clone(), self.format.clone()))
    }
}

/// Create mock claim handler for testing.
pub fn create_mock_claim_handler(
    format: &str,
    issuer: &str,
    claim_type: &str,
    token: &str,
) -> Arc<MockClaimHandler> {
    Arc::new(MockClaimHandler::new(format, issuer, claim_type, token))
}
